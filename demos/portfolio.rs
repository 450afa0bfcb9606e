//! Portfolio page walkthrough on the simulated host.
//!
//! Mounts the page with a `#projects` fragment, drives the clock through
//! the reconciliation, then scrolls down the document and watches sections
//! mount as they approach the viewport.
//!
//! Run with: cargo run --example portfolio

use std::rc::Rc;
use std::time::Duration;

use viewgate::{mount_page, Environment, PageConfig, PageSections, SectionId, SimEnv};

fn report(sim: &SimEnv, page: &viewgate::PageHandle, label: &str) {
    let mounted: Vec<&str> = SectionId::DEFERRED
        .into_iter()
        .filter(|s| page.is_mounted(*s))
        .map(|s| s.as_str())
        .collect();
    println!(
        "[{label}] scroll_top={:.0} progress={:.2} mounted={:?} footer={}",
        sim.scroll_top(),
        page.scroll_progress(),
        mounted,
        page.is_footer_mounted(),
    );
}

fn main() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("viewgate=debug")),
        )
        .init();

    let sim = SimEnv::new();
    sim.set_fragment(Some("#projects"));

    let env: Rc<dyn Environment> = Rc::new(sim.clone());
    let sections = PageSections::simulated(&env);
    let page = mount_page(env, PageConfig::default(), sections);

    report(&sim, &page, "load");

    // The first reconciliation attempt runs on the next animation frame.
    sim.run_frame();
    report(&sim, &page, "after frame");
    println!("scroll commands so far: {:?}", sim.scroll_commands());

    // Navigate to a section that is not mounted yet.
    sim.set_fragment(Some("#contact"));
    sim.run_frame();
    sim.advance(Duration::from_millis(240));
    report(&sim, &page, "after #contact");

    // Scroll to the bottom; the footer mounts by proximity alone.
    sim.scroll_to(sim.document_height());
    report(&sim, &page, "at bottom");

    println!("all scroll commands: {:?}", sim.scroll_commands());
    page.unmount();
    println!("unmounted, document height = {}", sim.document_height());
}
