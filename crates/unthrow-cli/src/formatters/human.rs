//! Human-readable formatter for analysis results.

use colored::*;
use std::collections::HashMap;
use unthrow_engine::{Analysis, ProblemCategory, RedundancyProblem};

pub struct HumanFormatter;

pub fn print_results(analysis: &Analysis) {
    println!("\nUnthrow Analysis Results");
    println!("========================\n");

    println!("Statistics:");
    println!(
        "  Methods analyzed: {}",
        analysis.statistics.methods_analyzed
    );
    println!(
        "  Candidates emitted: {}",
        analysis.statistics.candidates_emitted
    );
    println!(
        "  Candidates retracted: {}",
        analysis.statistics.candidates_retracted
    );
    println!("  Duration: {}ms\n", analysis.statistics.duration_ms);

    if analysis.problems.is_empty() {
        println!("{}", "No redundant throws declarations found.".green());
    } else {
        // Group problems by category
        let mut by_category: HashMap<ProblemCategory, Vec<&RedundancyProblem>> = HashMap::new();
        for problem in &analysis.problems {
            by_category.entry(problem.category).or_default().push(problem);
        }

        println!(
            "{} ({}):",
            "Redundant throws declarations".yellow().bold(),
            analysis.problems.len()
        );
        for category in [
            ProblemCategory::PlainMethod,
            ProblemCategory::OverriddenMethod,
            ProblemCategory::AbstractMethod,
        ] {
            let Some(problems) = by_category.get(&category) else {
                continue;
            };
            println!("\n  {} ({}):", category.display_name(), problems.len());
            for problem in problems {
                println!(
                    "    {} declares {} but can never throw it",
                    problem.method_display.as_str().cyan(),
                    problem.type_name.as_str().red()
                );
            }
        }
    }

    if !analysis.errors.is_empty() {
        println!("\n{} ({}):", "Analysis errors".red().bold(), analysis.errors.len());
        for error in &analysis.errors {
            println!("  {}: {}", error.method, error.message);
        }
    }
    println!();
}
