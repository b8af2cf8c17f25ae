//! `dispatchd`: reads order drafts as JSON lines on stdin and places them.
//!
//! ```bash
//! echo '{"customer":"598991","items":[{"product_id":"p1","name":"Chivito","unit_price":420}],"location":{"lat":-31.38,"lng":-57.96}}' \
//!     | RUST_LOG=info dispatchd dispatch.toml
//! ```

use courier_dispatch::graph::StreetGraph;
use courier_dispatch::lifecycle::{setup_tracing, DispatchConfig, DispatchSystem};
use courier_dispatch::manifest::TracingSink;
use courier_dispatch::model::OrderDraft;
use courier_dispatch::DispatchError;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), DispatchError> {
    setup_tracing();

    let path = DispatchConfig::resolve_path(std::env::args().nth(1))?;
    let config = DispatchConfig::load(&path)?;
    info!(config = %path.display(), couriers = config.couriers.len(), "Configuration loaded");

    let graph = Arc::new(StreetGraph::load(&config.graph.path, &config.graph_options())?);
    let system = DispatchSystem::start(&config, graph, Arc::new(TracingSink)).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "Failed to read stdin");
                break;
            }
        };
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let draft: OrderDraft = match serde_json::from_str(&line) {
            Ok(draft) => draft,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed order draft");
                continue;
            }
        };

        let span = tracing::info_span!("order", line = line_no);
        match system.place_order(draft).instrument(span).await {
            Ok(report) => info!(
                customer = %report.customer,
                zone = ?report.zone,
                outcome = ?report.outcome,
                dispatch = ?report.dispatch,
                "Order placed"
            ),
            Err(e) => error!(line = line_no, error = %e, "Order placement failed"),
        }
    }

    system.shutdown().await?;
    info!("dispatchd stopped");
    Ok(())
}
