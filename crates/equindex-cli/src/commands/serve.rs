use equindex_store::PriceStore;

use crate::cli::ServeArgs;
use crate::error::CliError;

pub async fn run(args: &ServeArgs, store: PriceStore) -> Result<(), CliError> {
    println!(
        "open http://127.0.0.1:{}/ to see the index analytics dashboard",
        args.port
    );
    equindex_web::run_server(store, args.port).await?;
    Ok(())
}
