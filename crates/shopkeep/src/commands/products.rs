//! Product command handlers.

use std::sync::Arc;

use tabled::Tabled;

use shopkeep_core::{CatalogSnapshot, MainScope, Product, ProductDraft, Storefront, SyncStatus};

use crate::cli::{AddProductArgs, GlobalOpts, ProductsArgs, ProductsCommand};
use crate::config::ActiveProfile;
use crate::error::CliError;
use crate::output;

use super::util;

const EMPTY_CATALOG: &str = "You haven't added any products yet.";
const NO_MATCHES: &str = "No products match your search.";

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Buy")]
    buying: String,
    #[tabled(rename = "Sell")]
    selling: String,
    #[tabled(rename = "From")]
    buying_point: String,
    #[tabled(rename = "Date")]
    date: String,
}

fn price(amount: f64, unit: &str) -> String {
    if unit.is_empty() {
        format!("{amount:.2}")
    } else {
        format!("{amount:.2} / {unit}")
    }
}

impl From<&Arc<Product>> for ProductRow {
    fn from(p: &Arc<Product>) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            buying: price(p.buying_price, &p.buying_unit),
            selling: price(p.selling_price, &p.selling_unit),
            buying_point: p.buying_point.clone(),
            date: p.date.clone(),
        }
    }
}

fn detail(p: &Arc<Product>) -> String {
    let mut lines = vec![
        format!("ID:           {}", p.id),
        format!("Name:         {}", p.name),
        format!("Buying:       {}", price(p.buying_price, &p.buying_unit)),
        format!("Selling:      {}", price(p.selling_price, &p.selling_unit)),
        format!("Bought from:  {}", or_dash(&p.buying_point)),
        format!("Date:         {}", or_dash(&p.date)),
    ];
    if let Some(ref image) = p.image {
        lines.push(format!("Image:        {image}"));
    }
    if let Some(ref info) = p.price_info {
        lines.push(format!("Price info:   {info}"));
    }
    lines.join("\n")
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn render(global: &GlobalOpts, products: &[Arc<Product>], searching: bool) -> String {
    let empty = if searching { NO_MATCHES } else { EMPTY_CATALOG };
    output::render_list(
        &global.output,
        products,
        empty,
        |p| ProductRow::from(p),
        |p| p.id.clone(),
    )
}

fn draft(args: AddProductArgs) -> ProductDraft {
    let price = args.price.unwrap_or_default();
    ProductDraft {
        name: args.name,
        buying_price: args.buying_price.unwrap_or_else(|| price.clone()),
        selling_price: args.selling_price.unwrap_or(price),
        buying_unit: args.buying_unit,
        selling_unit: args.selling_unit,
        buying_point: args.buying_point,
        date: args.date,
        image: args.image,
        price_info: args.price_info,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ProductsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let active = ActiveProfile::load(global)?;
    let storefront = active.storefront()?;
    let _feedback = util::echo_feedback(&storefront, global);

    let result = run(args, &storefront, &active, global).await;
    storefront.teardown();
    result
}

async fn run(
    args: ProductsArgs,
    storefront: &Storefront,
    active: &ActiveProfile,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let spinner = util::spinner("Signing in...", global);
    let scope = util::sign_in(storefront, active, None).await;
    spinner.finish_and_clear();
    let scope = scope?;

    match args.command {
        ProductsCommand::List { search } => {
            let spinner = util::spinner("Loading products...", global);
            let snapshot = util::first_snapshot(storefront, &scope, active.timeout()).await;
            spinner.finish_and_clear();
            let snapshot = snapshot?;

            let query = search.unwrap_or_default();
            scope.search.apply_snapshot(&snapshot);
            scope.search.set_query(&query);
            let filtered = scope.search.filtered();

            let out = render(global, &filtered, !query.trim().is_empty());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProductsCommand::Get { id } => {
            util::first_snapshot(storefront, &scope, active.timeout()).await?;
            let product = scope
                .catalog
                .product(&id)
                .ok_or(CliError::ProductNotFound { id })?;
            let out = output::render_single(&global.output, &product, detail, |p| p.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProductsCommand::Add(add) => {
            let id = scope.catalog.add_product(&draft(add)).await?;
            output::print_output(&id, global.quiet);
            Ok(())
        }

        ProductsCommand::Watch { search } => watch(storefront, &scope, search, global).await,
    }
}

/// Print the catalog on every delivery until Ctrl-C or the catalog stops.
async fn watch(
    storefront: &Storefront,
    scope: &MainScope,
    search: Option<String>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let query = search.unwrap_or_default();
    let searching = !query.trim().is_empty();

    let print = |snapshot: &CatalogSnapshot| {
        scope.search.apply_snapshot(snapshot);
        scope.search.set_query(&query);
        if !global.quiet {
            eprintln!("── revision {} · {} products ──", snapshot.revision, snapshot.len());
        }
        let out = render(global, &scope.search.filtered(), searching);
        output::print_output(&out, global.quiet);
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => Ok(()),
        result = follow(storefront, scope, print) => result,
    }
}

/// Hand every catalog delivery to `on_snapshot` until the subscription
/// stops. A fault is an error; an unmount or ended stream is not.
async fn follow(
    storefront: &Storefront,
    scope: &MainScope,
    mut on_snapshot: impl FnMut(&CatalogSnapshot),
) -> Result<(), CliError> {
    let mut snapshots = scope.catalog.feed();
    let mut status = scope.catalog.status_feed();

    if let Some(snapshot) = snapshots.current() {
        on_snapshot(snapshot);
    }

    loop {
        tokio::select! {
            next = snapshots.changed() => match next {
                Some(Some(snapshot)) => on_snapshot(&snapshot),
                Some(None) => {}
                None => return stopped(storefront, scope.catalog.status()),
            },
            stop = status.wait_for(|s| matches!(s, SyncStatus::Faulted | SyncStatus::Cancelled)) => {
                return stopped(storefront, stop.unwrap_or(SyncStatus::Cancelled));
            }
        }
    }
}

fn stopped(storefront: &Storefront, status: SyncStatus) -> Result<(), CliError> {
    if status == SyncStatus::Faulted {
        Err(util::subscription_fault(storefront))
    } else {
        Ok(())
    }
}
