//! Command execution against a configured client.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use client_blockchain_core::{BaseWallet, SessionError};
use client_bootstrap::{ClientContext, ClientSession, SessionSlot};
use runtime::{
    EndReport, Event, EventBus, FundingGateway, FundingRequest, OperationEvent, OperationReport,
    SessionState, Topic, TransakWidget, trigger_funding,
};
use tokio::task::JoinHandle;
use url::Url;

use crate::cli::Command;

/// Run `command`, logging `wallet` in through `slot` when it needs a session.
pub async fn execute(
    command: Command,
    context: &ClientContext,
    slot: &mut SessionSlot,
    wallet: Option<Arc<dyn BaseWallet>>,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Chains => list_chains(context, out),
        Command::Status => status(slot.login(context, wallet).await?, context, out).await,
        Command::Create(args) => {
            let config = args.game_config()?;
            let machine = slot.login(context, wallet).await?.machine();
            machine.hydrate().await?;
            let report = machine.request_create(config).await?;
            print_report(out, &report, &machine.state())
        }
        Command::Complete => {
            let machine = slot.login(context, wallet).await?.machine();
            machine.hydrate().await?;
            let report = machine.request_complete_task().await?;
            print_report(out, &report, &machine.state())
        }
        Command::End => {
            let machine = slot.login(context, wallet).await?.machine();
            machine.hydrate().await?;
            let ended = machine.request_end().await?;
            print_end(out, &ended, &machine.state())
        }
        Command::Fund { amount } => fund(slot.login(context, wallet).await?, context, amount, out),
    }
}

async fn status(session: &ClientSession, context: &ClientContext, out: &mut impl Write) -> Result<()> {
    let state = session.machine().hydrate().await?;
    let chain = context.chain();
    writeln!(out, "Chain:         {} ({})", chain.name, chain.chain_id)?;
    writeln!(out, "Wallet:        {}", session.owner())?;
    writeln!(out, "Smart account: {}", session.handle().address)?;
    writeln!(out, "Game:          {}", describe(&state))?;
    Ok(())
}

fn fund(
    session: &ClientSession,
    context: &ClientContext,
    amount: Option<String>,
    out: &mut impl Write,
) -> Result<()> {
    let gateway = LinkGateway::new(context.config().funding_widget());
    trigger_funding(&gateway, session.handle(), context.chain(), amount)?;
    if let Some(link) = gateway.take() {
        writeln!(out, "Fund {} at:", session.handle().address)?;
        writeln!(out, "{link}")?;
    }
    Ok(())
}

fn list_chains(context: &ClientContext, out: &mut impl Write) -> Result<()> {
    let selected = context.chain().chain_id;
    for chain in context.registry().iter() {
        let marker = if chain.chain_id == selected { "*" } else { " " };
        writeln!(
            out,
            "{marker} {:>8}  {:<16} {}  {}",
            chain.chain_id, chain.name, chain.contract_address, chain.rpc_url
        )?;
    }
    Ok(())
}

fn print_report(out: &mut impl Write, report: &OperationReport, state: &SessionState) -> Result<()> {
    writeln!(out, "{} confirmed in block {}", report.kind, report.block_number)?;
    writeln!(out, "  {}", report.explorer_url)?;
    writeln!(out, "Game: {}", describe(state))?;
    Ok(())
}

fn print_end(out: &mut impl Write, ended: &EndReport, state: &SessionState) -> Result<()> {
    print_report(out, &ended.report, state)?;
    writeln!(
        out,
        "Outcome: {}, {}/{} tasks reported",
        ended.outcome, ended.game.task_completed, ended.game.task_amount
    )?;
    Ok(())
}

/// One-line summary of a session state.
pub fn describe(state: &SessionState) -> String {
    match state {
        SessionState::Unknown => "unknown (ledger not read)".to_string(),
        SessionState::Idle => "none".to_string(),
        SessionState::Active(game) | SessionState::Terminal { game, .. } => {
            let progress = format!(
                "{}/{} tasks, {} ETH staked, {} min focus / {} min break x {} rounds",
                game.task_completed,
                game.task_amount,
                game.stake_ether(),
                game.time / 60,
                game.break_time / 60,
                game.rounds
            );
            match state {
                SessionState::Terminal { outcome, .. } => format!("finished ({outcome}), {progress}"),
                _ => format!("active, {progress}"),
            }
        }
    }
}

/// Print operation progress to stderr until aborted.
pub fn watch_operations(events: &EventBus) -> JoinHandle<()> {
    let mut rx = events.subscribe(Topic::Operation);
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if let Event::Operation(OperationEvent::StatusChanged { pending, .. }) = event {
                match pending.tx_hash {
                    Some(tx_hash) => eprintln!("  {} {} ({tx_hash})", pending.kind, pending.status),
                    None => eprintln!("  {} {}", pending.kind, pending.status),
                }
            }
        }
    })
}

/// Funding gateway that resolves the on-ramp link for display.
struct LinkGateway {
    widget: TransakWidget,
    link: Mutex<Option<Url>>,
}

impl LinkGateway {
    fn new(widget: TransakWidget) -> Self {
        Self {
            widget,
            link: Mutex::new(None),
        }
    }

    fn take(&self) -> Option<Url> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl FundingGateway for LinkGateway {
    fn open(&self, request: &FundingRequest) -> client_blockchain_core::Result<()> {
        let url = self
            .widget
            .url(request)
            .map_err(|e| SessionError::InvalidConfig(format!("funding link: {e}")))?;
        *self.link.lock().unwrap_or_else(PoisonError::into_inner) = Some(url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CreateArgs;
    use client_blockchain_core::{MockAccountProvider, MockLedger, MockWallet};
    use client_bootstrap::{ClientBuilder, ClientConfig};

    fn context(ledger: &MockLedger) -> ClientContext {
        ClientBuilder::new(ClientConfig::default())
            .account_provider(Arc::new(MockAccountProvider::new(ledger.clone())))
            .ledger_reader(Arc::new(ledger.clone()))
            .build()
            .unwrap()
    }

    fn wallet() -> Option<Arc<dyn BaseWallet>> {
        Some(Arc::new(MockWallet::with_seed(3)))
    }

    async fn run(ctx: &ClientContext, command: Command) -> Result<String> {
        let mut out = Vec::new();
        let mut slot = SessionSlot::new();
        execute(command, ctx, &mut slot, wallet(), &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn create(tasks: u32) -> Command {
        Command::Create(CreateArgs {
            time: 25,
            tasks,
            stake: "0.01".into(),
            break_time: 5,
            rounds: 4,
        })
    }

    #[tokio::test]
    async fn chains_marks_selected_network() {
        let ledger = MockLedger::new();
        let out = run(&context(&ledger), Command::Chains).await.unwrap();

        assert!(out.starts_with("*    84532  Base Sepolia"));
    }

    #[tokio::test]
    async fn create_complete_and_status() {
        let ledger = MockLedger::new();
        let ctx = context(&ledger);

        let out = run(&ctx, create(2)).await.unwrap();
        assert!(out.contains("CreateGame confirmed"));
        assert!(out.contains("https://sepolia.basescan.org/tx/0x"));

        run(&ctx, Command::Complete).await.unwrap();
        let out = run(&ctx, Command::Status).await.unwrap();
        assert!(out.contains("Game:          active, 1/2 tasks"));

        run(&ctx, Command::Complete).await.unwrap();
        let out = run(&ctx, Command::End).await.unwrap();
        assert!(out.contains("EndGame confirmed"));
        assert!(out.contains("Game: none"));
        assert!(out.contains("Outcome: Completed, 2/2 tasks reported"));
    }

    #[tokio::test]
    async fn ending_early_reports_failed_outcome_and_status_stays_idle() {
        let ledger = MockLedger::new();
        let ctx = context(&ledger);

        run(&ctx, create(4)).await.unwrap();
        run(&ctx, Command::Complete).await.unwrap();
        let out = run(&ctx, Command::End).await.unwrap();
        assert!(out.contains("Outcome: Failed, 1/4 tasks reported"));

        let out = run(&ctx, Command::Status).await.unwrap();
        assert!(out.contains("Game:          none"));
        let err = run(&ctx, Command::Complete).await.unwrap_err();
        assert_eq!(err.downcast_ref::<SessionError>().unwrap().name(), "InvalidTransition");
        assert_eq!(ledger.submissions(), 3);
    }

    #[tokio::test]
    async fn missing_wallet_surfaces_taxonomy_error() {
        let ledger = MockLedger::new();
        let mut out = Vec::new();
        let mut slot = SessionSlot::new();
        let err = execute(Command::Status, &context(&ledger), &mut slot, None, &mut out)
            .await
            .unwrap_err();

        let session = err.downcast_ref::<SessionError>().unwrap();
        assert_eq!(session.name(), "NotAuthenticated");
    }

    #[tokio::test]
    async fn complete_without_game_is_invalid_transition() {
        let ledger = MockLedger::new();
        let err = run(&context(&ledger), Command::Complete).await.unwrap_err();

        let session = err.downcast_ref::<SessionError>().unwrap();
        assert_eq!(session.name(), "InvalidTransition");
        assert_eq!(ledger.submissions(), 0);
    }

    #[tokio::test]
    async fn fund_prints_onramp_link() {
        let ledger = MockLedger::new();
        let out = run(&context(&ledger), Command::Fund { amount: Some("25".into()) })
            .await
            .unwrap();

        assert!(out.contains("https://global-stg.transak.com/?"));
        assert!(out.contains("network=base_sepolia"));
        assert!(out.contains("defaultFiatAmount=25"));
    }

    #[test]
    fn describe_terminal_outcome() {
        let game = client_blockchain_core::Game {
            time: 1500,
            task_amount: 2,
            task_completed: 2,
            amount: client_blockchain_core::U256::ZERO,
            break_time: 300,
            rounds: 4,
            player: client_blockchain_core::Address::repeat_byte(1),
        };
        let state = SessionState::from_record(&game);

        assert!(describe(&state).starts_with("finished (Completed), 2/2 tasks"));
    }
}
