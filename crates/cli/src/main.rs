use std::io::Read;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pedigree_analysis_core::api::{handle_request_json, AnalysisResponse, PedigreeRecordDraft};
use pedigree_analysis_core::genetics::{
    compute_inbreeding, rank_candidates, Pedigree, PedigreeAnalysisResult,
};
use pedigree_analysis_core::{AnalysisConfig, PedigreeAnalyzer};

#[derive(Parser)]
#[command(name = "pedigree-analysis")]
#[command(version)]
#[command(about = "Coefficient of inbreeding and breeding-risk guidance for dog matings")]
struct Cli {
    /// Path to a TOML config file (generation bounds, risk thresholds)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a proposed or recorded mating
    Analyze {
        /// Path to pedigree CSV (columns: dog, sire, dam)
        #[arg(short, long)]
        pedigree: String,

        /// Sire id
        #[arg(short, long)]
        sire: String,

        /// Dam id
        #[arg(short, long)]
        dam: String,

        /// Generations to look back (default from config, 6 if unset)
        #[arg(short, long)]
        generations: Option<usize>,

        /// Id of the resulting dog, to emit a pedigree record draft
        #[arg(long)]
        offspring: Option<String>,

        /// Output format: "text" (default) or "json"
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Rank candidate dams for one sire, least inbred first
    Rank {
        /// Path to pedigree CSV (columns: dog, sire, dam)
        #[arg(short, long)]
        pedigree: String,

        /// Sire id
        #[arg(short, long)]
        sire: String,

        /// Candidate dam ids (repeatable)
        #[arg(short, long, required = true)]
        dam: Vec<String>,

        /// Generations to look back
        #[arg(short, long)]
        generations: Option<usize>,
    },

    /// Inbreeding coefficient of every dog in the pedigree (unbounded depth)
    Inbreeding {
        /// Path to pedigree CSV (columns: dog, sire, dam)
        #[arg(short, long)]
        pedigree: String,

        /// Only list dogs with a non-zero coefficient
        #[arg(long)]
        inbred_only: bool,
    },

    /// Report dangling parent references and ancestry cycles
    Check {
        /// Path to pedigree CSV (columns: dog, sire, dam)
        #[arg(short, long)]
        pedigree: String,
    },

    /// Answer a JSON analysis request ({"sireId", "damId", "generations"?})
    Request {
        /// Path to pedigree CSV (columns: dog, sire, dam)
        #[arg(short, long)]
        pedigree: String,

        /// Request file; "-" (default) reads stdin
        #[arg(short, long, default_value = "-")]
        input: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load config from '{}'", path))?,
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Commands::Analyze {
            pedigree,
            sire,
            dam,
            generations,
            offspring,
            format,
        } => cmd_analyze(
            &pedigree,
            config,
            &sire,
            &dam,
            generations,
            offspring.as_deref(),
            &format,
        ),
        Commands::Rank {
            pedigree,
            sire,
            dam,
            generations,
        } => cmd_rank(&pedigree, config, &sire, &dam, generations),
        Commands::Inbreeding {
            pedigree,
            inbred_only,
        } => cmd_inbreeding(&pedigree, inbred_only),
        Commands::Check { pedigree } => cmd_check(&pedigree),
        Commands::Request { pedigree, input } => cmd_request(&pedigree, config, &input),
    }
}

fn load_pedigree(path: &str) -> Result<Pedigree> {
    let ped = Pedigree::from_csv(path)
        .with_context(|| format!("Failed to load pedigree from '{}'", path))?;
    eprintln!("Loaded pedigree with {} dogs from '{}'", ped.n_dogs(), path);
    Ok(ped)
}

fn load_analyzer(path: &str, config: AnalysisConfig) -> Result<PedigreeAnalyzer<Pedigree>> {
    let ped = load_pedigree(path)?;
    PedigreeAnalyzer::with_config(ped, config).context("Invalid analysis configuration")
}

fn cmd_analyze(
    pedigree_path: &str,
    config: AnalysisConfig,
    sire: &str,
    dam: &str,
    generations: Option<usize>,
    offspring: Option<&str>,
    output_format: &str,
) -> Result<()> {
    let analyzer = load_analyzer(pedigree_path, config)?;
    let result = analyzer
        .analyze(sire, dam, generations)
        .with_context(|| format!("Analysis of {} x {} failed", sire, dam))?;

    match output_format.to_lowercase().as_str() {
        "json" => print_json(&result, offspring)?,
        "text" => print_text(&result, offspring),
        other => anyhow::bail!("Unknown format '{}'. Use 'text' (default) or 'json'.", other),
    }
    Ok(())
}

fn print_text(result: &PedigreeAnalysisResult, offspring: Option<&str>) {
    println!("{}", result.summary());

    if !result.contributions().is_empty() {
        println!("Relationship paths:");
        for c in result.contributions() {
            println!(
                "  {} | {}   (n1={}, n2={})",
                c.sire_path, c.dam_path, c.sire_generations, c.dam_generations
            );
        }
    }

    if let Some(dog) = offspring {
        let draft = PedigreeRecordDraft::from_result(result, Some(dog));
        println!(
            "\nPedigree record draft: dog={} sire={} dam={} generation={} coefficient={:.4}",
            dog, draft.sire_id, draft.dam_id, draft.generation, draft.coefficient
        );
    }
}

fn print_json(result: &PedigreeAnalysisResult, offspring: Option<&str>) -> Result<()> {
    let mut map = serde_json::Map::new();
    map.insert(
        "analysis".to_string(),
        serde_json::to_value(AnalysisResponse::from(result))?,
    );
    map.insert("generations".to_string(), serde_json::json!(result.generations()));
    map.insert("riskBand".to_string(), serde_json::to_value(result.risk_band())?);

    let paths: Vec<serde_json::Value> = result
        .contributions()
        .iter()
        .map(|c| {
            serde_json::json!({
                "ancestorId": c.ancestor,
                "sirePath": c.sire_path.dogs(),
                "damPath": c.dam_path.dogs(),
            })
        })
        .collect();
    map.insert("paths".to_string(), serde_json::json!(paths));

    if let Some(dog) = offspring {
        map.insert(
            "recordDraft".to_string(),
            serde_json::to_value(PedigreeRecordDraft::from_result(result, Some(dog)))?,
        );
    }

    let json_str = serde_json::to_string_pretty(&serde_json::Value::Object(map))?;
    println!("{}", json_str);
    Ok(())
}

fn cmd_rank(
    pedigree_path: &str,
    config: AnalysisConfig,
    sire: &str,
    dams: &[String],
    generations: Option<usize>,
) -> Result<()> {
    let analyzer = load_analyzer(pedigree_path, config)?;
    let ranked = rank_candidates(&analyzer, sire, dams, generations);

    println!("{:<4} {:<24} {:>12} {:>12}  Guidance", "#", "Dam", "F", "Diversity");
    for (i, candidate) in ranked.iter().enumerate() {
        match &candidate.outcome {
            Ok(r) => println!(
                "{:<4} {:<24} {:>12.4} {:>12.4}  {}",
                i + 1,
                candidate.dam_id,
                r.inbreeding_coefficient(),
                r.genetic_diversity(),
                r.recommendations().join("; ")
            ),
            Err(e) => println!("{:<4} {:<24} {:>12} {:>12}  {}", "-", candidate.dam_id, "-", "-", e),
        }
    }
    Ok(())
}

fn cmd_inbreeding(pedigree_path: &str, inbred_only: bool) -> Result<()> {
    let ped = load_pedigree(pedigree_path)?;
    let report = compute_inbreeding(&ped).context("Failed to compute inbreeding")?;

    let inbred = report.iter().filter(|(_, f)| *f > 0.0).count();
    println!("{} dogs, {} inbred", report.len(), inbred);
    if !report.is_empty() {
        let mean = report.iter().map(|(_, f)| f).sum::<f64>() / report.len() as f64;
        println!("Mean coefficient: {:.4}\n", mean);
    }

    for (id, f) in &report {
        if inbred_only && *f == 0.0 {
            continue;
        }
        println!("  {:<24} {:.4}", id, f);
    }
    Ok(())
}

fn cmd_check(pedigree_path: &str) -> Result<()> {
    let ped = load_pedigree(pedigree_path)?;
    let report = ped.validate();

    println!("Dogs: {}   Founders: {}", report.n_dogs, report.n_founders);
    if report.is_clean() {
        println!("No problems found.");
        return Ok(());
    }

    for d in &report.dangling {
        println!("dangling: '{}' references unknown {} '{}'", d.dog, d.role, d.parent);
    }
    for id in &report.self_parents {
        println!("self-parent: '{}' is listed as its own parent", id);
    }
    if !report.cyclic.is_empty() {
        println!("cycle: {} dogs are on or below an ancestry cycle:", report.cyclic.len());
        for id in &report.cyclic {
            println!("  {}", id);
        }
    }
    Ok(())
}

fn cmd_request(pedigree_path: &str, config: AnalysisConfig, input: &str) -> Result<()> {
    let analyzer = load_analyzer(pedigree_path, config)?;

    let body = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read request from '{}'", input))?
    };

    println!("{}", handle_request_json(&analyzer, &body));
    Ok(())
}
