//! Plain-text rendering of a finished run.

use covey_orchestrator::{MetricsSnapshot, SwarmRun, TaskResult};
use std::fmt::Write;

/// Render a run and the swarm metrics for the terminal.
pub fn render(run: &SwarmRun, metrics: &MetricsSnapshot) -> String {
    let mut out = String::new();
    let total = run.tasks.len();

    let _ = writeln!(
        out,
        "Run {}: {}/{} tasks succeeded, confidence {}, {} ms",
        run.run_id,
        run.successful_count(),
        total,
        run.confidence,
        run.duration_ms
    );

    if let Some(synthesized) = &run.synthesized_result {
        let _ = writeln!(out, "\nSummary\n  {}", synthesized.summary);

        if !synthesized.recommendations.is_empty() {
            let _ = writeln!(out, "\nRecommendations");
            for (i, rec) in synthesized.recommendations.iter().enumerate() {
                let _ = writeln!(out, "  {}. {rec}", i + 1);
            }
        }
        if let Some(risk) = synthesized.risk_level {
            let _ = writeln!(out, "\nRisk level: {risk}");
        }
        if let Some(statement) = &synthesized.confidence_statement {
            let _ = writeln!(out, "Confidence: {statement}");
        }
        if let Some(note) = &synthesized.note {
            let _ = writeln!(out, "\nNote: {note}");
        }
        if synthesized.synthesis_failed {
            let _ = writeln!(out, "\nRaw agent output\n{}", synthesized.narrative.trim_end());
        }
    }

    if total > 0 {
        let _ = writeln!(out, "\nTasks");
        for task in &run.tasks {
            let status = run.result_for(task.id).map_or("missing".to_string(), status_label);
            let time = run
                .result_for(task.id)
                .map_or(0, |r| r.execution_time_ms);
            let _ = writeln!(
                out,
                "  {:<14} {:<24} {:<20} {:>8} ms",
                task.kind.to_string(),
                task.agent_id,
                status,
                time
            );
        }
    }

    let swarm = &metrics.swarm;
    let _ = writeln!(
        out,
        "\nSwarm: {} tasks, efficiency {:.1}%, avg task time {:.0} ms, peak in flight {}",
        swarm.total_tasks,
        swarm.swarm_efficiency_percent,
        swarm.average_task_time_ms,
        swarm.peak_in_flight
    );

    out
}

fn status_label(result: &TaskResult) -> String {
    match result.error_kind {
        None => "ok".to_string(),
        Some(kind) => kind.to_string(),
    }
}
