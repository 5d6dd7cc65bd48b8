//! `itinera chat` — Interactive or single-message chat mode.

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use itinera_catalog::CatalogService;
use itinera_config::AppConfig;
use itinera_core::{
    Classifier, CompletionGateway, ConversationEntry, EntryId, EntryStatus, Product, Role,
};
use itinera_markup::{derive_segments, RenderSegment, UnknownRefPolicy};
use itinera_providers::{ScriptedGateway, ZhipuGateway};
use itinera_session::{ConversationSession, SessionOptions};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let catalog = Arc::new(
        CatalogService::from_embedded().map_err(|e| format!("Failed to load catalog: {e}"))?,
    );

    let (classifier, completion): (Arc<dyn Classifier>, Arc<dyn CompletionGateway>) =
        match &config.api_key {
            Some(key) => {
                info!(model = %config.model, "Using Zhipu gateway");
                let gateway = Arc::new(
                    ZhipuGateway::new(key.clone())
                        .with_base_url(config.base_url.clone())
                        .with_model(config.model.clone())
                        .with_sampling(config.temperature, config.top_p),
                );
                (gateway.clone(), gateway)
            }
            None => {
                warn!("No API key configured; falling back to the scripted gateway");
                eprintln!();
                eprintln!("  No API key configured — replaying the built-in sample itinerary.");
                eprintln!("  Set ITINERA_API_KEY or ZHIPUAI_API_KEY for live responses,");
                eprintln!(
                    "  or add api_key to {}",
                    AppConfig::config_dir().join("config.toml").display()
                );
                eprintln!();
                let gateway =
                    Arc::new(ScriptedGateway::itinerary().with_delay(Duration::from_millis(30)));
                (gateway.clone(), gateway)
            }
        };

    let mut session = ConversationSession::new(classifier, completion, catalog.clone())
        .with_options(SessionOptions {
            materialization: config.session.entry_materialization,
        });

    let policy = config.session.unknown_ref_policy;

    if let Some(msg) = message {
        // Single message mode
        let mut printer = EntryPrinter::new(catalog.clone(), policy);
        session.submit(&msg, |entry| printer.publish(entry)).await;
        printer.flush_cards();
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Itinera — 东京旅游助手");
    println!("  Model: {}", config.model);
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }
        if matches!(line.as_str(), "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }

        let mut printer = EntryPrinter::new(catalog.clone(), policy);
        session.submit(&line, |entry| printer.publish(entry)).await;
        printer.flush_cards();

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  再见！👋");
    println!();

    Ok(())
}

/// Prints entry snapshots as they arrive.
///
/// The committed document grows by prefix, so each snapshot is printed as a
/// delta past what was already written. Placeholders enter the committed text
/// whole, so a delta never tears one; they render inline as the product name.
struct EntryPrinter {
    catalog: Arc<CatalogService>,
    policy: UnknownRefPolicy,
    current: Option<(EntryId, usize)>,
    final_refs: Vec<String>,
}

impl EntryPrinter {
    fn new(catalog: Arc<CatalogService>, policy: UnknownRefPolicy) -> Self {
        Self {
            catalog,
            policy,
            current: None,
            final_refs: Vec::new(),
        }
    }

    fn publish(&mut self, entry: &ConversationEntry) {
        if entry.role == Role::User {
            return; // the user just typed it
        }

        let printed = match &self.current {
            Some((id, printed)) if *id == entry.id => *printed,
            _ => {
                println!();
                print!("  Assistant > ");
                0
            }
        };

        let delta = &entry.content[printed.min(entry.content.len())..];
        if !delta.is_empty() {
            print!("{}", self.render_inline(delta));
            let _ = std::io::stdout().flush();
        }
        self.current = Some((entry.id.clone(), entry.content.len()));

        if entry.status == EntryStatus::Final {
            println!();
            self.final_refs = entry.referenced_ids.clone();
        }
    }

    /// Print product cards for the finalized entry's references.
    fn flush_cards(&mut self) {
        let mut seen: Vec<&str> = Vec::new();
        for id in &self.final_refs {
            if seen.contains(&id.as_str()) {
                continue;
            }
            seen.push(id);
            if let Some(p) = self.catalog.products().iter().find(|p| &p.id == id) {
                print_card(p);
            }
        }
        println!();
    }

    fn render_inline(&self, delta: &str) -> String {
        let mut out = String::with_capacity(delta.len());
        for segment in derive_segments(delta, self.catalog.products(), self.policy) {
            match segment {
                RenderSegment::Text { content } => out.push_str(&content),
                RenderSegment::ProductRef { id } => {
                    if let Some(p) = self.catalog.products().iter().find(|p| p.id == id) {
                        out.push_str(&format!("【{}】", p.name));
                    }
                }
            }
        }
        out
    }
}

fn print_card(p: &Product) {
    println!();
    println!("  ┌─ 📦 {}", p.name);
    println!("  │  价格: ¥{}    时长: {}", p.price, p.duration);
    if !p.recommendation.is_empty() {
        println!("  │  {}", p.recommendation);
    }
    if !p.booking_url.is_empty() {
        println!("  │  预订: {}", p.booking_url);
    }
    println!("  └─");
}
