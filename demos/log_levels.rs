//! Log levels as a named-constants namespace.
//!
//! Run with `RUST_LOG=named_constants=debug cargo run --example log_levels`
//! to watch namespaces being finalized.

use named_constants::{constants, NamespaceBuilder, Render};
use tracing_subscriber::EnvFilter;

constants! {
    /// Severity thresholds, printed by name.
    #[render(name)]
    pub mod Level {
        DEBUG = 10;
        INFO = 20;
        WARNING = 30;
        ERROR = 40;

        /// Whether `severity` passes the `threshold`.
        pub fn at_least(severity: i64, threshold: i64) -> bool {
            severity >= threshold
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("== Rendering ==");
    println!("display: {}", *Level::WARNING);
    println!("debug:   {:?}", *Level::WARNING);
    println!("value:   {}", Level::WARNING.value());
    println!("math:    {}", *Level::WARNING + 5i64);

    println!("\n== Enumeration ==");
    for constant in &*Level::NAMESPACE {
        println!("  {:<8} = {}", constant.name(), constant.raw());
    }

    println!("\n== Lookup ==");
    for query in [30i64, 40, 45] {
        match Level::NAMESPACE.lookup(query) {
            Ok(level) => println!("  {query} -> {level}"),
            Err(err) => println!("  {query} -> {err}"),
        }
    }
    match Level::NAMESPACE.lookup("INFO") {
        Ok(level) => println!("  \"INFO\" -> {:?}", level),
        Err(err) => println!("  \"INFO\" -> {err}"),
    }
    println!(
        "  ERROR passes WARNING: {}",
        Level::at_least(*Level::ERROR.value(), *Level::WARNING.value())
    );

    println!("\n== Runtime namespace ==");
    let http = NamespaceBuilder::new("Http")
        .render(Render::Name)
        .constant("OK", 200u16)
        .constant("NOT_FOUND", 404u16)
        .constant("_INTERNAL", 599u16)
        .finish();
    println!("  {http:?}");
    println!("  ignored: {:?}", http.ignored());
    if let Err(err) = http.remove("OK") {
        println!("  remove OK: {err}");
    }
}
