//! Output formatters for analysis results.

pub mod human;
pub mod json;

pub use human::HumanFormatter;
pub use json::JsonFormatter;

/// Trait for formatting analysis results
pub trait Formatter {
    /// Format and print the analysis results
    fn format(&self, analysis: &unthrow_engine::Analysis);
}

impl Formatter for HumanFormatter {
    fn format(&self, analysis: &unthrow_engine::Analysis) {
        human::print_results(analysis);
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, analysis: &unthrow_engine::Analysis) {
        json::print_json(analysis);
    }
}
