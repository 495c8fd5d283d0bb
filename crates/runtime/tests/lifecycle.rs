//! Session lifecycle against the in-memory ledger.
//!
//! Time is paused: polling and timeouts advance virtual time only.

use std::sync::Arc;
use std::time::Duration;

use client_blockchain_core::{
    Address, ChainDescriptor, GameConfig, LedgerReader, MockLedger, OperationKind, SessionError,
    SmartAccount, SmartAccountHandle, U256,
};
use runtime::{
    Event, EventBus, OperationEvent, Outcome, RuntimeBuilder, RuntimeConfig, SessionEvent,
    SessionMachine, SessionState, Topic,
};

const CHAIN_ID: u64 = 84532;

fn base_sepolia() -> ChainDescriptor {
    ChainDescriptor {
        name: "Base Sepolia".to_string(),
        contract_address: "0x166c5cef16D3234621059EEa66c1144A4F4807E2".parse().unwrap(),
        rpc_url: "https://sepolia.base.org".to_string(),
        explorer_url_prefix: "https://sepolia.basescan.org/tx/".to_string(),
        chain_id: CHAIN_ID,
    }
}

fn session(ledger: &MockLedger, events: EventBus) -> SessionMachine {
    let owner = Address::repeat_byte(0x01);
    let account: Arc<dyn SmartAccount> = Arc::new(ledger.account_for(owner, CHAIN_ID));
    let reader: Arc<dyn LedgerReader> = Arc::new(ledger.clone());

    RuntimeBuilder::new(reader)
        .config(
            RuntimeConfig::default()
                .with_confirmation_timeout(Duration::from_secs(30))
                .with_poll_interval(Duration::from_secs(2)),
        )
        .events(events)
        .build(SmartAccountHandle::new(account, owner), base_sepolia())
}

fn scenario_config() -> GameConfig {
    GameConfig::from_minutes(25, 4, "0.01", 5, 4).unwrap()
}

fn task_progress(state: &SessionState) -> (u32, u32) {
    let game = state.game().expect("state should carry a game");
    (game.task_completed, game.task_amount)
}

#[tokio::test(start_paused = true)]
async fn create_complete_and_end_a_game() {
    let ledger = MockLedger::new();
    let machine = session(&ledger, EventBus::new());

    assert_eq!(machine.state(), SessionState::Unknown);
    assert_eq!(machine.hydrate().await.unwrap(), SessionState::Idle);

    // Scenario A: create, confirmed, ledger returns the configured record
    machine.request_create(scenario_config()).await.unwrap();
    let game = ledger.game_of(machine.handle().address);
    assert_eq!(game.time, 1500);
    assert_eq!(game.task_amount, 4);
    assert_eq!(game.task_completed, 0);
    assert_eq!(game.amount, U256::from(10_000_000_000_000_000u64));
    assert_eq!(game.break_time, 300);
    assert_eq!(game.rounds, 4);
    assert_eq!(game.player, machine.handle().address);
    assert_eq!(machine.state(), SessionState::Active(game));

    // Scenario B: three tasks, still active
    for _ in 0..3 {
        machine.request_complete_task().await.unwrap();
    }
    assert!(machine.state().is_active());
    assert_eq!(task_progress(&machine.state()), (3, 4));

    // Scenario C: the fourth task finishes the game
    machine.request_complete_task().await.unwrap();
    assert!(matches!(
        machine.state(),
        SessionState::Terminal {
            outcome: Outcome::Completed,
            ..
        }
    ));
    assert_eq!(task_progress(&machine.state()), (4, 4));

    // The ledger clears the record on end
    let ended = machine.request_end().await.unwrap();
    assert_eq!(ended.report.kind, OperationKind::EndGame);
    assert!(ended.report.explorer_url.starts_with("https://sepolia.basescan.org/tx/0x"));
    assert_eq!(ended.outcome, Outcome::Completed);
    assert_eq!(machine.state(), SessionState::Idle);
    assert_eq!(ledger.submissions(), 6);
}

#[tokio::test(start_paused = true)]
async fn second_request_while_outstanding_is_rejected() {
    let ledger = MockLedger::new();
    let machine = Arc::new(session(&ledger, EventBus::new()));
    machine.hydrate().await.unwrap();

    ledger.hold_inclusion(true);
    let first = tokio::spawn({
        let machine = Arc::clone(&machine);
        async move { machine.request_create(scenario_config()).await }
    });

    while ledger.submissions() == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(machine.in_flight(), Some(OperationKind::CreateGame));

    // Scenario D: no second submission happens
    let err = machine.request_create(scenario_config()).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::OperationInFlight {
            in_flight: OperationKind::CreateGame
        }
    ));
    let err = machine.request_end().await.unwrap_err();
    assert!(matches!(err, SessionError::OperationInFlight { .. }));
    assert_eq!(ledger.submissions(), 1);

    ledger.release();
    first.await.unwrap().unwrap();
    assert!(machine.state().is_active());
    assert_eq!(machine.in_flight(), None);
}

#[tokio::test(start_paused = true)]
async fn timeout_keeps_hash_and_hydrate_resolves_it() {
    let ledger = MockLedger::new();
    let events = EventBus::new();
    let mut operations = events.subscribe(Topic::Operation);
    let machine = session(&ledger, events);
    machine.hydrate().await.unwrap();

    ledger.hold_confirmation(true);
    let err = machine.request_create(scenario_config()).await.unwrap_err();

    assert!(matches!(err, SessionError::Timeout { kind: OperationKind::CreateGame, .. }));
    assert!(err.tx_hash().is_some());
    assert!(err.requires_rehydrate());
    // State is untouched until the ledger is read again
    assert_eq!(machine.state(), SessionState::Idle);
    assert_eq!(machine.in_flight(), None);

    let mut terminal = Vec::new();
    while let Ok(Event::Operation(event)) = operations.try_recv() {
        if event.is_terminal() {
            terminal.push(event);
        }
    }
    assert_eq!(terminal.len(), 1);
    assert!(matches!(
        &terminal[0],
        OperationEvent::Failed { reason, tx_hash: Some(_), .. } if reason == "Timeout"
    ));

    // The transaction did land; hydrate is what reveals it
    assert!(machine.hydrate().await.unwrap().is_active());
}

#[tokio::test(start_paused = true)]
async fn rejected_submission_leaves_state_and_is_not_retried() {
    let ledger = MockLedger::new();
    let machine = session(&ledger, EventBus::new());
    machine.hydrate().await.unwrap();

    ledger.reject_submissions(Some("user declined signature"));
    let err = machine.request_create(scenario_config()).await.unwrap_err();

    assert!(matches!(err, SessionError::SubmissionRejected(_)));
    assert!(!err.is_retryable());
    assert_eq!(machine.state(), SessionState::Idle);
    assert_eq!(ledger.submissions(), 0);
}

#[tokio::test(start_paused = true)]
async fn requests_outside_their_state_are_refused() {
    let ledger = MockLedger::new();
    let machine = session(&ledger, EventBus::new());

    // Nothing read yet
    let err = machine.request_create(scenario_config()).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidTransition { .. }));

    machine.hydrate().await.unwrap();
    let err = machine.request_complete_task().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidTransition {
            requested: OperationKind::CompleteTask,
            ..
        }
    ));
    assert!(machine.request_end().await.is_err());

    machine.request_create(scenario_config()).await.unwrap();
    let err = machine.request_create(scenario_config()).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidTransition { .. }));
    assert_eq!(ledger.submissions(), 1);
}

#[tokio::test(start_paused = true)]
async fn invalid_config_is_caught_before_submission() {
    let ledger = MockLedger::new();
    let machine = session(&ledger, EventBus::new());
    machine.hydrate().await.unwrap();

    let config = GameConfig {
        task_amount: 0,
        ..scenario_config()
    };
    let err = machine.request_create(config).await.unwrap_err();

    assert!(matches!(err, SessionError::InvalidConfig(_)));
    assert_eq!(ledger.submissions(), 0);
    assert_eq!(machine.in_flight(), None);
}

#[tokio::test(start_paused = true)]
async fn read_failure_leaves_state_unchanged() {
    let ledger = MockLedger::new();
    let machine = session(&ledger, EventBus::new());
    machine.hydrate().await.unwrap();

    ledger.fail_reads(Some("rpc unreachable"));
    let err = machine.refresh().await.unwrap_err();

    assert!(matches!(err, SessionError::LedgerReadFailed(_)));
    assert!(err.is_retryable());
    assert_eq!(machine.state(), SessionState::Idle);

    ledger.fail_reads(None);
    assert_eq!(machine.refresh().await.unwrap(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn repeated_hydrate_is_idempotent_and_cached() {
    let ledger = MockLedger::new();
    let machine = session(&ledger, EventBus::new());
    machine.hydrate().await.unwrap();
    machine.request_create(scenario_config()).await.unwrap();

    let reads = ledger.reads();
    let first = machine.hydrate().await.unwrap();
    let second = machine.hydrate().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(ledger.reads(), reads);
}

#[tokio::test(start_paused = true)]
async fn ending_early_is_a_failed_outcome() {
    let ledger = MockLedger::new();
    let machine = session(&ledger, EventBus::new());
    machine.hydrate().await.unwrap();

    machine.request_create(scenario_config()).await.unwrap();
    machine.request_complete_task().await.unwrap();
    let ended = machine.request_end().await.unwrap();

    assert_eq!(ended.outcome, Outcome::Failed);
    assert_eq!((ended.game.task_completed, ended.game.task_amount), (1, 4));
    assert_eq!(machine.state(), SessionState::Idle);

    // Nothing left to end; a new game may start
    assert!(machine.request_end().await.is_err());
    machine.request_create(scenario_config()).await.unwrap();
    assert_eq!(task_progress(&machine.state()), (0, 4));
}

#[tokio::test(start_paused = true)]
async fn create_that_lands_after_timeout_hydrates_active() {
    let ledger = MockLedger::new();
    let machine = session(&ledger, EventBus::new());
    machine.hydrate().await.unwrap();

    machine.request_create(scenario_config()).await.unwrap();
    machine.request_end().await.unwrap();
    assert_eq!(machine.state(), SessionState::Idle);

    ledger.hold_confirmation(true);
    let err = machine.request_create(scenario_config()).await.unwrap_err();
    assert!(err.requires_rehydrate());
    assert_eq!(machine.state(), SessionState::Idle);

    ledger.release();
    let state = machine.hydrate().await.unwrap();
    assert!(state.is_active());
    assert_eq!(task_progress(&state), (0, 4));

    // The landed game is usable; creating again is refused locally
    machine.request_complete_task().await.unwrap();
    let err = machine.request_create(scenario_config()).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidTransition { .. }));
    assert_eq!(ledger.submissions(), 4);
}

#[tokio::test(start_paused = true)]
async fn abandoned_request_before_submission_leaves_nothing_behind() {
    let ledger = MockLedger::new();
    let events = EventBus::new();
    let mut operations = events.subscribe(Topic::Operation);
    let machine = session(&ledger, events);
    machine.hydrate().await.unwrap();

    ledger.stall_submissions(true);
    let abandoned =
        tokio::time::timeout(Duration::from_secs(5), machine.request_create(scenario_config()))
            .await;
    assert!(abandoned.is_err());

    assert_eq!(machine.in_flight(), None);
    assert_eq!(machine.state(), SessionState::Idle);
    assert_eq!(ledger.submissions(), 0);
    while let Ok(Event::Operation(event)) = operations.try_recv() {
        assert!(!event.is_terminal());
    }

    ledger.stall_submissions(false);
    machine.request_create(scenario_config()).await.unwrap();
    assert!(machine.state().is_active());
    assert_eq!(ledger.submissions(), 1);
}

#[tokio::test(start_paused = true)]
async fn lost_acknowledgement_is_resolved_by_hydrate_not_resubmission() {
    let ledger = MockLedger::new();
    let machine = session(&ledger, EventBus::new());
    machine.hydrate().await.unwrap();

    ledger.lose_acknowledgements(true);
    let err = machine.request_create(scenario_config()).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Timeout {
            kind: OperationKind::CreateGame,
            tx_hash: None,
            ..
        }
    ));
    assert!(!err.is_retryable());
    assert_eq!(machine.state(), SessionState::Idle);
    assert_eq!(machine.in_flight(), None);

    ledger.lose_acknowledgements(false);
    assert!(machine.hydrate().await.unwrap().is_active());
    assert_eq!(ledger.submissions(), 1);
}

#[tokio::test(start_paused = true)]
async fn session_topic_reports_transitions() {
    let ledger = MockLedger::new();
    let events = EventBus::new();
    let mut sessions = events.subscribe(Topic::Session);
    let machine = session(&ledger, events);

    machine.hydrate().await.unwrap();
    machine.request_create(scenario_config()).await.unwrap();

    let mut transitions = Vec::new();
    while let Ok(Event::Session(SessionEvent::StateChanged { from, to, .. })) = sessions.try_recv()
    {
        transitions.push((from.label(), to.label()));
    }
    assert_eq!(
        transitions,
        vec![
            ("Unknown".to_string(), "Idle".to_string()),
            ("Idle".to_string(), "Active".to_string()),
        ]
    );
}
