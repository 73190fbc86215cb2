pub mod doctor;

use anyhow::Result;

use sift::config::SiftConfig;
use sift::orchestrator::state::Query;
use sift::orchestrator::Orchestrator;

/// One-shot query from the command line: run the orchestrator and print the
/// answer with its evidence trail.
pub async fn ask(config: SiftConfig, question: String, limit: Option<usize>) -> Result<()> {
    let orchestrator = Orchestrator::from_config(&config)?;
    let query = Query {
        question,
        generation_credential: None,
        limit_override: limit,
    };

    let answer = orchestrator.run(query).await?;

    println!("{}", answer.answer);
    println!();
    println!(
        "[route={} tier={} confidence={:.2} reason={}]",
        answer.route,
        answer.confidence_tier.as_str(),
        answer.confidence,
        answer.reason_code
    );
    if !answer.evidence.is_empty() {
        println!("Evidence:");
        for item in &answer.evidence {
            println!("  {:<9} {:.2}  {}", item.source_type, item.score, item.source_id);
        }
    }

    Ok(())
}
