//! Walks one manager through a full state cycle.
//!
//! Run with: cargo run --example cycle_demo

use state_monitor_agent::{core::StateId, Scenario, SAMPLE_CAPACITY};

fn main() {
    println!("State Monitor Agent - Cycle Demo");
    println!("================================");
    println!();

    let mut manager = match Scenario::Cycle.build_manager(Some(7), 0) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Error building manager: {e}");
            return;
        }
    };

    let mut returned_to_idle = false;
    for _ in 0..(SAMPLE_CAPACITY * 3) {
        let report = match manager.update() {
            Ok(report) => report,
            Err(e) => {
                eprintln!("Tick skipped: {e}");
                continue;
            }
        };

        println!("[tick {:>2}] {}", report.tick, report.status_line());
        if let Some(transition) = report.transition {
            println!("          transition {} -> {}", transition.from, transition.to);
            if transition.to == StateId::Idle {
                returned_to_idle = true;
                break;
            }
        }
    }

    println!();
    if returned_to_idle {
        println!("Completed one full cycle in {} ticks.", manager.tick_count());
    } else {
        println!("Cycle did not complete.");
    }
}
