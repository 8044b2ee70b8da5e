//! Grade command - score one nutrient profile offline

use anyhow::{Context, Result};
use nutri_grade_adapters::rules::load_rules_or_default;
use nutri_grade_domain::{
    Assessment, CategoryFlag, CategoryFlags, NutrientProfile, RevisionId, score,
};
use std::io::{self, Read};
use std::path::PathBuf;

use crate::args::GradeArgs;
use crate::config::AppConfig;

pub async fn execute(args: GradeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_default();
    let revision_id = config.revision_id(args.revision.as_deref())?;

    let profile = read_profile(&args)?;
    let flags = resolve_flags(&args, &config)?;

    tracing::debug!(
        revision = %revision_id,
        flags = ?flags.active(),
        "Grading profile"
    );

    let assessment = score(&profile, &flags, &revision_id.revision())
        .context("Nutrient profile cannot be scored")?;

    if args.json {
        let output = serde_json::json!({
            "revision": revision_id.as_str(),
            "grade": assessment.grade(),
            "reason": assessment.null_reason(),
            "flags": flags,
            "profile": profile,
            "assessment": assessment,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_assessment(revision_id, &assessment, args.explain);
    }

    Ok(())
}

fn read_profile(args: &GradeArgs) -> Result<NutrientProfile> {
    let Some(ref path) = args.file else {
        return Ok(NutrientProfile {
            energy: args.energy,
            sugars: args.sugars,
            saturated_fats: args.saturated_fats,
            salt: args.salt,
            proteins: args.proteins,
            fiber: args.fiber,
            fruit_veg_legumes_percent: args.fruit_veg,
        });
    };

    let raw = if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?
    };

    serde_json::from_str(&raw).context("Failed to parse nutrient profile JSON")
}

fn resolve_flags(args: &GradeArgs, config: &AppConfig) -> Result<CategoryFlags> {
    let mut flags = if args.categories.is_empty() {
        CategoryFlags::default()
    } else {
        let rules_path = args.rules.as_ref().or(config.classifier.rules_path.as_ref());
        let rules = load_rules_or_default(rules_path.map(PathBuf::as_path))
            .context("Failed to load classifier rules")?;
        rules.classify(&args.categories)
    };

    for raw in &args.flags {
        let flag = raw.parse::<CategoryFlag>().map_err(anyhow::Error::msg)?;
        flags.set(flag);
    }

    Ok(flags)
}

fn print_assessment(revision_id: RevisionId, assessment: &Assessment, explain: bool) {
    match assessment {
        Assessment::Graded(graded) => {
            println!("Grade: {} (revision {})", graded.grade, revision_id);

            if explain {
                let b = &graded.breakdown;
                println!();
                println!("Formula: {:?}", graded.formula);
                println!("Final score: {}", graded.final_score);
                println!();
                println!("Negative points: {}", b.points_a());
                println!("  Energy: {}", b.energy_points);
                println!("  Sugars: {}", b.sugar_points);
                println!("  Saturated fats: {}", b.saturates_points);
                println!("  Salt: {}", b.salt_points);
                println!("Positive points: {}", b.points_c());
                println!("  Proteins: {}", b.protein_points);
                println!("  Fiber: {}", b.fiber_points);
                println!("  Fruit/veg/legumes: {}", b.fruit_veg_points);
            }
        }
        Assessment::NotApplicable { exclusion } => {
            println!("Grade: none (revision {})", revision_id);
            println!(
                "  Reason: {} ({:?})",
                exclusion.null_reason().as_str(),
                exclusion
            );
        }
    }
}
