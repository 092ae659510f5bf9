use super::ui;
use crate::core::allocation::{
    self, Allocation, AllocationMode, AllocationRequest, PortfolioHistory,
};
use crate::core::config::AppConfig;
use crate::core::{Notice, PriceProvider, Strategy, strategy};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use comfy_table::Cell;

/// Inputs collected from the command line.
#[derive(Debug, Clone)]
pub struct AllocateArgs {
    pub amount: f64,
    pub strategies: Vec<String>,
    pub history: bool,
}

pub async fn run(
    args: &AllocateArgs,
    config: &AppConfig,
    provider: &(dyn PriceProvider + Send + Sync),
    as_of: NaiveDate,
) -> Result<()> {
    let request = build_request(args, config, as_of)?;

    let (strategies, _) = allocation::normalize_selection(&request.strategies)?;
    println!("{}", render_strategy_info(&strategies));

    let pb = ui::new_progress_bar(strategy::resolve(&strategies).len() as u64, true);
    pb.set_message("Fetching prices...");
    let result = allocation::allocate(&request, provider, &|| pb.inc(1)).await;
    pb.finish_and_clear();
    let allocation = result?;

    for notice in &allocation.notices {
        eprintln!("{}", render_notice(notice));
    }

    println!("{}", render_portfolio(&allocation));
    if let Some(history) = &allocation.history {
        println!("\n{}", render_history(history));
    }
    ui::print_separator();

    Ok(())
}

/// Validates command line input against the config and turns it into a request.
pub fn build_request(
    args: &AllocateArgs,
    config: &AppConfig,
    as_of: NaiveDate,
) -> Result<AllocationRequest> {
    if !args.amount.is_finite() || args.amount < config.min_investment {
        bail!(
            "Investment amount must be at least {:.2} USD, got {:.2}",
            config.min_investment,
            args.amount
        );
    }

    let strategies = args
        .strategies
        .iter()
        .map(|name| name.parse::<Strategy>())
        .collect::<Result<Vec<_>>>()?;

    let mode = if args.history {
        AllocationMode::History {
            days: config.history_days,
        }
    } else {
        AllocationMode::LatestClose
    };

    Ok(AllocationRequest {
        investment: args.amount,
        strategies,
        mode,
        as_of,
    })
}

fn render_notice(notice: &Notice) -> String {
    let text = notice.to_string();
    match notice {
        Notice::SelectionTruncated { .. } => ui::style_text(&text, ui::StyleType::Error),
        _ => ui::style_text(&text, ui::StyleType::Warning),
    }
}

fn render_strategy_info(strategies: &[Strategy]) -> String {
    let mut output = String::from("Information on the selected strategies:\n");
    for strategy in strategies {
        output.push_str(&format!(
            "\n  {}: {}",
            ui::style_text(strategy.name(), ui::StyleType::TotalLabel),
            ui::style_text(strategy.description(), ui::StyleType::Subtle)
        ));
    }
    output
}

pub fn render_portfolio(allocation: &Allocation) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Investment (USD)"),
        ui::header_cell("Current Price"),
        ui::header_cell("Shares"),
    ]);

    for entry in allocation.portfolio.entries() {
        table.add_row(vec![
            Cell::new(&entry.ticker),
            ui::number_cell(format!("{:.2}", entry.investment)),
            ui::number_cell(format!("{:.2}", entry.price)),
            ui::number_cell(format!("{:.4}", entry.shares)),
        ]);
    }

    let strategy_names: Vec<_> = allocation.strategies.iter().map(Strategy::name).collect();
    let mut output = format!(
        "Portfolio: {}\n\n",
        ui::style_text(&strategy_names.join(" + "), ui::StyleType::Title)
    );

    if allocation.portfolio.is_empty() {
        output.push_str(&ui::style_text(
            "No holdings could be priced.",
            ui::StyleType::Error,
        ));
    } else {
        output.push_str(&table.to_string());
    }

    output.push_str(&format!(
        "\n\n{} {} ({} of {} tickers, {:.2} USD each)",
        ui::style_text("Total Invested (USD):", ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{:.2}", allocation.portfolio.total_investment()),
            ui::StyleType::TotalValue
        ),
        allocation.portfolio.len(),
        allocation.tickers.len(),
        allocation.investment_per_asset
    ));

    output
}

pub fn render_history(history: &PortfolioHistory) -> String {
    let mut table = ui::new_styled_table();

    let mut header = vec![ui::header_cell("Ticker")];
    header.extend(
        history
            .total
            .iter()
            .map(|p| ui::header_cell(&p.date.format("%b %d").to_string())),
    );
    table.set_header(header);

    for asset in &history.assets {
        let mut row = vec![Cell::new(&asset.ticker)];
        row.extend(history.total.iter().map(|day| {
            let value = asset
                .values
                .iter()
                .find(|v| v.date == day.date)
                .map(|v| v.value);
            ui::format_optional_cell(value, |v| format!("{v:.2}"))
        }));
        table.add_row(row);
    }

    let mut total_row = vec![Cell::new("Total")];
    total_row.extend(
        history
            .total
            .iter()
            .map(|p| ui::total_cell(format!("{:.2}", p.value))),
    );
    table.add_row(total_row);

    let values: Vec<f64> = history.total.iter().map(|p| p.value).collect();
    let trend = match (history.total.first(), history.total.last()) {
        (Some(first), Some(last)) => format!(
            "{} {:.2} → {:.2}",
            ui::sparkline(&values),
            first.value,
            last.value
        ),
        _ => "N/A".to_string(),
    };

    format!(
        "Portfolio value over the last {} days:\n\n{}\n\n{} {}",
        history.total.len(),
        table,
        ui::style_text("Total value trend:", ui::StyleType::TotalLabel),
        trend
    )
}
