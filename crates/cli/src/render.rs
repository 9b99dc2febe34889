use stockmate_core::domain::analysis::AnalysisResult;
use stockmate_core::domain::discovery::DiscoveryCandidate;
use stockmate_core::domain::watchlist::Watchlist;
use stockmate_core::monitor::CycleReport;

pub const DISCLAIMER: &str = "StockMate AI is an experimental tool built on a generative AI service. \
Its output is not financial advice, an investment recommendation or a solicitation. \
Trading stocks carries significant risk, including the loss of invested capital, \
and any decision you make with this information is your sole responsibility.";

pub fn print_analysis(result: &AnalysisResult, watched: bool) {
    let strength = if result.is_strong { " (strong)" } else { "" };
    println!("{} - {}", result.symbol, result.company_name);
    println!("Signal:    {}{strength}", result.signal);
    println!("Price:     {} ({})", result.price, result.change);
    println!("Horizon:   {}", result.horizon);
    println!("Sentiment: {}", result.sentiment);
    println!();
    println!("{}", result.reasoning);
    if !result.technical_analysis.is_empty() {
        println!();
        println!("Technical: {}", result.technical_analysis);
    }
    if !result.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &result.sources {
            let title = if source.title.is_empty() { &source.uri } else { &source.title };
            println!("  - {title} <{}>", source.uri);
        }
    }
    println!();
    println!(
        "As of {}{}",
        result.timestamp.format("%Y-%m-%d %H:%M"),
        if watched { " | in watchlist" } else { "" }
    );
}

pub fn print_candidates(candidates: &[DiscoveryCandidate]) {
    for candidate in candidates {
        let symbol = if candidate.symbol.is_empty() { "?" } else { candidate.symbol.as_str() };
        println!("{symbol:<10} {}", candidate.company_name);
        if !candidate.potential_reason.is_empty() {
            println!("           [{}]", candidate.potential_reason);
        }
        if !candidate.brief_reasoning.is_empty() {
            println!("           {}", candidate.brief_reasoning);
        }
    }
}

pub fn print_watchlist(watchlist: &Watchlist) {
    if watchlist.is_empty() {
        println!("The watchlist is empty.");
        return;
    }
    for entry in watchlist.entries() {
        let strong = if entry.last_strong { "*" } else { " " };
        println!(
            "{:<10} {:<8}{strong} {:<14} {}  {}",
            entry.symbol,
            entry.last_signal.as_str(),
            entry.last_price,
            entry.added_at,
            entry.company_name
        );
    }
}

pub fn print_cycle_report(report: &CycleReport) {
    println!(
        "Refreshed {} entries, {} failed, {} alerts.",
        report.refreshed,
        report.failed.len(),
        report.events.len()
    );
    if !report.failed.is_empty() {
        println!("Kept previous data for: {}", report.failed.join(", "));
    }
}
