use crate::machine::StateMachine;
use crate::oracle::CompletionOracle;
use crate::page::AlbumPage;
use crate::remote_log::LogSink;
use std::time::Duration;
use tracing::info;

/// Pause between two handler invocations.
pub const TICK: Duration = Duration::from_millis(10);

/// Runs the machine forever, one handler at a time.  Only returns if the
/// surrounding task is dropped.
pub async fn run<P, O, L>(machine: &mut StateMachine<P, O, L>)
where
    P: AlbumPage,
    O: CompletionOracle,
    L: LogSink,
{
    info!("driver loop started in {}", machine.state());
    loop {
        machine.step().await;
        tokio::time::sleep(TICK).await;
    }
}
