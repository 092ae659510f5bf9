use super::ui;
use crate::core::Strategy;
use comfy_table::Cell;

pub fn render() -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Strategy"),
        ui::header_cell("Tickers"),
        ui::header_cell("Description"),
    ]);

    for strategy in Strategy::ALL {
        table.add_row(vec![
            Cell::new(strategy.name()),
            Cell::new(strategy.tickers().join(", ")),
            Cell::new(ui::style_text(strategy.description(), ui::StyleType::Subtle)),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Investment Strategies", ui::StyleType::Title),
        table
    )
}

pub fn run() {
    println!("{}", render());
}
