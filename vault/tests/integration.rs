use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use vaultgov_core::{
    Address, Amount, BlockNumber, ErrorKind, InMemoryToken, ManualClock, OracleError, PoolId,
    PoolInfo, RewardOracle, TokenLedger, ACC_REWARD_PRECISION, DAY, TOKEN_UNIT,
};
use vaultgov_sim::{EmissionSchedule, SimulatedPair, SimulatedRewardPool};
use vaultgov_vault::{
    Account, SharedVault, Vault, VaultCollaborators, VaultConfig, VaultError, VaultEvent,
    VotingEscrow, DEFAULT_QUADRATIC_SCALE,
};

const P: u128 = ACC_REWARD_PRECISION;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Staking pool whose accumulator is driven by the test instead of by
/// emission, so that different deposit patterns see the same trajectory
struct ScriptedPool {
    address: Address,
    pair: SimulatedPair,
    reward: InMemoryToken,
    state: Mutex<ScriptedState>,
}

#[derive(Default)]
struct ScriptedState {
    acc: u128,
    stake: Amount,
    debt: Amount,
}

impl ScriptedPool {
    fn set_acc(&self, acc: u128) {
        self.state.lock().acc = acc;
    }

    fn harvest(&self, state: &mut ScriptedState, to: &Address) {
        let pending = state.stake * state.acc / P - state.debt;
        if pending > 0 {
            self.reward.mint(to, pending).unwrap();
        }
    }
}

impl RewardOracle for ScriptedPool {
    fn address(&self) -> Address {
        self.address
    }

    fn deposit(
        &self,
        depositor: &Address,
        _pool: PoolId,
        amount: Amount,
    ) -> Result<(), OracleError> {
        let mut state = self.state.lock();
        self.harvest(&mut state, depositor);
        self.pair
            .transfer_from(&self.address, depositor, &self.address, amount)?;
        state.stake += amount;
        state.debt = state.stake * state.acc / P;
        Ok(())
    }

    fn withdraw(
        &self,
        depositor: &Address,
        _pool: PoolId,
        amount: Amount,
    ) -> Result<(), OracleError> {
        let mut state = self.state.lock();
        self.harvest(&mut state, depositor);
        self.pair.transfer(&self.address, depositor, amount)?;
        state.stake -= amount;
        state.debt = state.stake * state.acc / P;
        Ok(())
    }

    fn pool_info(&self, _pool: PoolId) -> Result<PoolInfo, OracleError> {
        Ok(PoolInfo {
            token: self.pair.address(),
            alloc_point: 1,
            last_reward_block: BlockNumber::MAX,
            acc_reward_per_share: self.state.lock().acc,
        })
    }

    fn get_multiplier(&self, _from: BlockNumber, _to: BlockNumber) -> u128 {
        0
    }

    fn reward_per_block(&self) -> Amount {
        0
    }

    fn total_alloc_point(&self) -> u128 {
        1
    }
}

struct Deployment {
    clock: ManualClock,
    reward: InMemoryToken,
    pair: SimulatedPair,
    vault: SharedVault,
    governance: Address,
}

impl Deployment {
    fn fund(&self, who: &Address, reward: Amount, shares: Amount) {
        let vault = self.vault.address();
        self.reward.mint(who, reward).unwrap();
        self.reward.approve(who, &vault, Amount::MAX).unwrap();
        self.pair.mint_shares(who, shares).unwrap();
        self.pair.approve(who, &vault, Amount::MAX).unwrap();
    }
}

fn tokens_and_pair(clock: &ManualClock) -> (InMemoryToken, SimulatedPair) {
    let reward = InMemoryToken::new(Address::derive("reward"), "RWD");
    let pair = SimulatedPair::new(
        Address::derive("pair"),
        reward.address(),
        Address::derive("quote"),
        Arc::new(clock.clone()),
    );
    pair.seed_liquidity(&Address::derive("lp"), 1_000_000, 1_000_000).unwrap();
    (reward, pair)
}

fn deploy(
    reward_pool: Arc<dyn RewardOracle>,
    clock: ManualClock,
    reward: InMemoryToken,
    pair: SimulatedPair,
    pid: PoolId,
) -> Deployment {
    let config = VaultConfig::new(
        Address::derive("vault"),
        reward.address(),
        pair.address(),
        reward_pool.address(),
        pid,
    );
    let vault = Vault::new(
        config,
        VaultCollaborators {
            reward_token: Arc::new(reward.clone()),
            pair: Arc::new(pair.clone()),
            reward_pool,
            clock: Arc::new(clock.clone()),
        },
    )
    .unwrap();
    let vault = SharedVault::new(vault);

    let governance = Address::derive("governance");
    vault
        .set_governance(&Address::derive("deployer"), governance)
        .unwrap();

    Deployment {
        clock,
        reward,
        pair,
        vault,
        governance,
    }
}

fn scripted() -> (Deployment, Arc<ScriptedPool>) {
    let clock = ManualClock::new(1_700_000_000, 1);
    let (reward, pair) = tokens_and_pair(&clock);
    let pool = Arc::new(ScriptedPool {
        address: Address::derive("scripted-pool"),
        pair: pair.clone(),
        reward: reward.clone(),
        state: Mutex::new(ScriptedState::default()),
    });
    let deployment = deploy(pool.clone(), clock, reward, pair, 0);
    (deployment, pool)
}

fn emitting() -> (Deployment, Arc<SimulatedRewardPool>) {
    let clock = ManualClock::new(1_700_000_000, 1);
    let (reward, pair) = tokens_and_pair(&clock);
    let pool = Arc::new(SimulatedRewardPool::new(
        Address::derive("chef"),
        reward.clone(),
        Arc::new(clock.clone()),
        EmissionSchedule {
            reward_per_block: TOKEN_UNIT,
            start_block: 0,
            bonus_end_block: 0,
            bonus_multiplier: 1,
        },
    ));
    let pid = pool.add_pool(100, Arc::new(pair.clone()));
    let deployment = deploy(pool.clone(), clock, reward, pair, pid);
    (deployment, pool)
}

#[test]
fn test_deposit_100_and_withdraw_immediately() {
    init_logging();
    let (d, _) = emitting();
    let alice = Address::derive("alice");
    d.fund(&alice, 100, 0);

    d.vault.deposit(&alice, 100, 0).unwrap();
    assert_eq!(d.vault.votes(&alice), 100);
    assert!(!d.vault.is_frozen(&alice));

    d.vault.withdraw_all(&alice).unwrap();
    assert_eq!(d.reward.balance_of(&alice), 100);
    assert_eq!(d.vault.account(&alice), Account::default());
}

#[test]
fn test_withdraw_with_nothing_deposited_is_noop() {
    let (d, _) = emitting();
    let nobody = Address::derive("nobody");

    d.vault.withdraw_all(&nobody).unwrap();
    assert!(d
        .vault
        .read()
        .events()
        .iter()
        .all(|e| !matches!(e, VaultEvent::Withdrawn { .. })));
}

#[test]
fn test_split_deposits_at_same_accumulator_match_single_deposit() {
    init_logging();
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for _ in 0..20 {
        let (d, pool) = scripted();
        let split = Address::derive("split");
        let whole = Address::derive("whole");

        let parts: Vec<Amount> = (0..rng.random_range(2..5))
            .map(|_| rng.random_range(1..10_000u128))
            .collect();
        let total: Amount = parts.iter().sum();
        d.fund(&split, 0, total);
        d.fund(&whole, 0, total);

        let start = rng.random_range(0..5u128) * P;
        let end = start + rng.random_range(1..5u128) * P;
        pool.set_acc(start);

        for part in &parts {
            d.vault.deposit(&split, 0, *part).unwrap();
        }
        d.vault.deposit(&whole, 0, total).unwrap();

        pool.set_acc(end);
        let owed_split = d.vault.pending_reward(&split).unwrap();
        let owed_whole = d.vault.pending_reward(&whole).unwrap();
        assert_eq!(owed_split, owed_whole);

        d.vault.withdraw_all(&split).unwrap();
        d.vault.withdraw_all(&whole).unwrap();
        assert_eq!(d.reward.balance_of(&split), owed_split);
        assert_eq!(d.reward.balance_of(&whole), owed_whole);
        assert_eq!(d.pair.balance_of(&split), total);
    }
}

#[test]
fn test_settlement_is_conservative_across_deposit_cycles() {
    init_logging();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for _ in 0..20 {
        let (d, pool) = scripted();
        let alice = Address::derive("alice");

        let mut acc: u128 = 0;
        let mut tranches: Vec<(Amount, u128)> = Vec::new();
        let mut raw_reward: Amount = 0;

        for _ in 0..rng.random_range(1..6) {
            acc += rng.random_range(0..4u128) * P;
            pool.set_acc(acc);

            let shares = rng.random_range(1..1_000u128);
            let reward = rng.random_range(0..1_000u128);
            d.fund(&alice, reward, shares);
            d.vault.deposit(&alice, reward, shares).unwrap();

            tranches.push((shares, acc));
            raw_reward += reward;
        }

        acc += rng.random_range(1..4u128) * P;
        pool.set_acc(acc);

        // Each tranche earns from the accumulator at its own deposit onwards
        let earned: Amount = tranches
            .iter()
            .map(|(shares, at)| shares * (acc - at) / P)
            .sum();

        d.vault.withdraw_all(&alice).unwrap();
        assert_eq!(d.reward.balance_of(&alice), raw_reward + earned);
        assert_eq!(d.vault.votes(&alice), 0);
    }
}

#[test]
fn test_rounding_shortfall_never_touches_other_deposits() {
    init_logging();
    let (d, pool) = scripted();
    let alice = Address::derive("alice");
    let bob = Address::derive("bob");
    let carol = Address::derive("carol");
    d.fund(&alice, 0, 1);
    d.fund(&bob, 0, 1);
    d.fund(&carol, 50, 0);
    d.vault.deposit(&carol, 50, 0).unwrap();

    // Each account floors its own share of a half-unit accumulator, the pool
    // floors once for the vault's combined stake
    d.vault.deposit(&bob, 0, 1).unwrap();
    pool.set_acc(P / 2);
    d.vault.deposit(&alice, 0, 1).unwrap();
    pool.set_acc(P);

    d.vault.withdraw_all(&alice).unwrap();
    assert_eq!(d.reward.balance_of(&alice), 1);
    assert_eq!(d.vault.read().reward_reserve(), 0);

    // Bob's stake comes back even though the pool paid nothing more
    d.vault.withdraw_all(&bob).unwrap();
    assert_eq!(d.pair.balance_of(&bob), 1);
    assert_eq!(d.reward.balance_of(&bob), 0);
    assert!(d.vault.account(&bob).is_empty());

    d.vault.withdraw_all(&carol).unwrap();
    assert_eq!(d.reward.balance_of(&carol), 50);
    assert_eq!(d.reward.balance_of(&d.vault.address()), 0);
}

#[test]
fn test_emission_rewards_flow_through_vault() {
    init_logging();
    let (d, pool) = emitting();
    let alice = Address::derive("alice");
    let bob = Address::derive("bob");
    d.fund(&alice, 0, 1_000);
    d.fund(&bob, 0, 3_000);

    // Shares are priced against the reward reserve at deposit time
    let expected_power = 1_000 * 1_000_000 / d.pair.total_supply();
    d.vault.deposit(&alice, 0, 1_000).unwrap();
    d.vault.deposit(&bob, 0, 3_000).unwrap();
    assert_eq!(d.vault.votes(&alice), expected_power);

    d.clock.advance_blocks(4);
    let pending_alice = d.vault.pending_reward(&alice).unwrap();
    let pending_bob = d.vault.pending_reward(&bob).unwrap();
    assert_eq!(pending_alice + pending_bob, 4 * TOKEN_UNIT);
    assert_eq!(pending_bob, 3 * pending_alice);

    d.vault.withdraw_all(&alice).unwrap();
    assert_eq!(d.reward.balance_of(&alice), pending_alice);
    assert_eq!(pool.staked(0, &d.vault.address()), 3_000);
}

#[test]
fn test_withdraw_succeeds_exactly_at_freeze_deadline() {
    let (d, _) = emitting();
    let alice = Address::derive("alice");
    d.fund(&alice, 10, 10);
    d.vault.deposit(&alice, 10, 10).unwrap();

    d.vault.freeze(&d.governance, &alice, 7 * DAY).unwrap();
    let until = d.vault.read().freeze_until(&alice);

    d.clock.set_time(until - 1);
    let err = d.vault.withdraw_all(&alice).unwrap_err();
    assert!(matches!(err, VaultError::Frozen { .. }));
    assert_eq!(err.kind(), ErrorKind::Precondition);

    d.clock.set_time(until);
    d.vault.withdraw_all(&alice).unwrap();
    assert_eq!(d.pair.balance_of(&alice), 10);
}

#[test]
fn test_freeze_never_decreases() {
    let (d, _) = emitting();
    let alice = Address::derive("alice");
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut last = 0;

    for _ in 0..50 {
        let duration = rng.random_range(0..10 * DAY);
        d.clock.advance_time(rng.random_range(0..DAY));
        d.vault.freeze(&d.governance, &alice, duration).unwrap();

        let until = d.vault.read().freeze_until(&alice);
        assert!(until >= last);
        last = until;
    }
}

#[test]
fn test_quadratic_votes_are_sublinear() {
    let (d, _) = emitting();
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    for i in 0..20 {
        let small = Address::derive(&format!("small-{}", i));
        let large = Address::derive(&format!("large-{}", i));
        let x = rng.random_range(1..1_000_000 * TOKEN_UNIT);
        d.fund(&small, x, 0);
        d.fund(&large, 4 * x, 0);
        d.vault.deposit(&small, x, 0).unwrap();
        d.vault.deposit(&large, 4 * x, 0).unwrap();

        let q_small = d.vault.quadratic_votes(&small).unwrap();
        let q_large = d.vault.quadratic_votes(&large).unwrap();
        assert!(q_large >= q_small);
        assert!(q_large <= 2 * q_small + DEFAULT_QUADRATIC_SCALE);
    }
}

#[test]
fn test_governance_handover() {
    let (d, _) = emitting();
    let next = Address::derive("next-governance");
    let alice = Address::derive("alice");

    let err = d.vault.set_governance(&alice, alice).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);

    d.vault.set_governance(&d.governance, next).unwrap();
    assert!(d.vault.freeze(&d.governance, &alice, DAY).is_err());
    d.vault.freeze(&next, &alice, DAY).unwrap();
    assert!(d.vault.is_frozen(&alice));
}
