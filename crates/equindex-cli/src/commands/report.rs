use equindex_core::TradeDate;
use equindex_report::{ReportFormat, StatsExporter};
use equindex_store::PriceStore;

use crate::cli::ReportCommand;
use crate::error::CliError;

pub fn run(command: &ReportCommand, store: &PriceStore) -> Result<(), CliError> {
    let exporter = StatsExporter::new(store.clone());

    let path = match command {
        ReportCommand::Composition(args) => {
            let format = ReportFormat::parse(&args.format)?;
            let date = TradeDate::parse(&args.date)?;
            exporter.dump_composition(&date.to_string(), format, &args.out)?
        }
        ReportCommand::Performance(args) => {
            let format = ReportFormat::parse(&args.format)?;
            exporter.dump_performance(format, &args.out)?
        }
    };

    println!("report written to {}", path.display());
    Ok(())
}
