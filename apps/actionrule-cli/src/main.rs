use actionrule_author::RuleEditor;
use actionrule_common::{ActionId, AxisType, AxisValue, Handedness, InputAction, Pose, SourceId};
use actionrule_input::{AnyRule, ComparisonOp, RuleEngine, RuleEvent};
use actionrule_profile::{ProfileDocument, partition_name};
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use glam::{Quat, Vec2, Vec3};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "actionrule-cli", about = "CLI tool for input action rule profiles")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load and compile a profile, reporting its rules per axis
    Validate {
        /// Profile document (.yaml, .yml or .json)
        profile: PathBuf,
    },
    /// List base action candidates, or the rule actions a base can raise
    Actions {
        profile: PathBuf,
        /// Base action id to list compatible rule actions for
        #[arg(long)]
        base: Option<u32>,
    },
    /// Feed a sequence of base action values through the rule engine
    Simulate {
        profile: PathBuf,
        /// Base action id
        #[arg(long)]
        base: u32,
        /// Event source id
        #[arg(long, default_value = "1")]
        source: u32,
        /// Handedness of the source: none, left, right or both
        #[arg(long, default_value = "none")]
        hand: Handedness,
        /// Disconnect the source after the last value
        #[arg(long)]
        disconnect: bool,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
        /// Values after `--`: true/false, 0.5, "x,y", "x,y,z", "x,y,z,w"
        /// or "px,py,pz,rx,ry,rz,rw"
        #[arg(required = true, last = true)]
        values: Vec<String>,
    },
    /// Add a rule to a profile and save it
    AddRule {
        profile: PathBuf,
        #[arg(long)]
        base: u32,
        #[arg(long)]
        rule: u32,
        /// Criteria compared for equality (defaults to the neutral value)
        #[arg(long, allow_hyphen_values = true)]
        criteria: Option<String>,
        /// Criteria rule value; enables the criteria rule
        #[arg(long, allow_hyphen_values = true)]
        criteria_rule: Option<String>,
        /// Criteria rule comparison: eq, lt, le, gt, ge
        #[arg(long, value_parser = parse_comparison, requires = "criteria_rule")]
        comparison: Option<ComparisonOp>,
    },
    /// Remove a rule from a profile and save it
    RemoveRule {
        profile: PathBuf,
        /// Rule list: digital, single_axis, dual_axis, vector_axis, quaternion_axis, pose_axis
        #[arg(long, value_parser = parse_partition)]
        axis: AxisType,
        #[arg(long)]
        index: usize,
    },
}

#[derive(Serialize)]
struct StepEvent<'a> {
    step: usize,
    #[serde(flatten)]
    event: &'a RuleEvent,
}

/// Events emitted per input step, plus the digital actions still raised at the end.
struct Simulation {
    steps: Vec<(usize, Vec<RuleEvent>)>,
    active: Vec<(SourceId, Handedness, InputAction)>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("actionrule-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", actionrule_common::crate_info());
            println!("input: {}", actionrule_input::crate_info());
            println!("profile: {}", actionrule_profile::crate_info());
            println!("author: {}", actionrule_author::crate_info());
        }
        Commands::Validate { profile } => {
            let doc = ProfileDocument::load(&profile)
                .with_context(|| format!("loading {}", profile.display()))?;
            let compiled = doc.compile()?;
            println!(
                "{}: {} actions, {} rules",
                profile.display(),
                compiled.registry.len(),
                compiled.rules.len()
            );
            for axis in AxisType::RULE_AXES {
                println!(
                    "  {:<16} {}",
                    partition_name(&axis),
                    compiled.rules.count(axis)
                );
            }
            for rule in compiled.rules.iter_any() {
                println!("  {}", describe_rule(&rule));
            }
        }
        Commands::Actions { profile, base } => {
            let compiled = ProfileDocument::load(&profile)?.compile()?;
            let actions = match base {
                Some(id) => {
                    let base = compiled.registry.resolve(ActionId(id))?;
                    println!("rule actions for {base}:");
                    compiled.registry.compatible_rule_actions(base)
                }
                None => {
                    println!("base action candidates:");
                    compiled.registry.base_action_candidates()
                }
            };
            for action in actions {
                println!(
                    "  {:>4}  {:<20} {}",
                    action.id.0, action.description, action.axis_constraint
                );
            }
        }
        Commands::Simulate {
            profile,
            base,
            source,
            hand,
            disconnect,
            json,
            values,
        } => {
            let sim = simulate(&profile, base, SourceId(source), hand, disconnect, &values)?;
            for (step, events) in &sim.steps {
                for event in events {
                    if json {
                        let line = StepEvent { step: *step, event };
                        println!("{}", serde_json::to_string(&line)?);
                    } else {
                        print_event(*step, event);
                    }
                }
            }
            if !json {
                for (source, handedness, action) in &sim.active {
                    println!("still raised: {action} on {source}/{handedness}");
                }
            }
        }
        Commands::AddRule {
            profile,
            base,
            rule,
            criteria,
            criteria_rule,
            comparison,
        } => {
            let (axis, index) = add_rule(
                &profile,
                base,
                rule,
                criteria.as_deref(),
                criteria_rule.as_deref(),
                comparison.unwrap_or_default(),
            )?;
            println!("added {} rule #{index}", partition_name(&axis));
        }
        Commands::RemoveRule {
            profile,
            axis,
            index,
        } => {
            let removed = remove_rule(&profile, axis, index)?;
            println!("removed #{index}: {}", describe_rule(&removed));
        }
    }

    Ok(())
}

fn simulate(
    profile: &Path,
    base: u32,
    source: SourceId,
    hand: Handedness,
    disconnect: bool,
    values: &[String],
) -> anyhow::Result<Simulation> {
    let compiled = ProfileDocument::load(profile)?.compile()?;
    let base = compiled.registry.resolve(ActionId(base))?.clone();
    let mut engine = RuleEngine::new(compiled.rules);

    let mut steps = Vec::new();
    for (i, raw) in values.iter().enumerate() {
        let value = parse_value(base.axis_constraint, raw)?;
        let mut events = Vec::new();
        engine.on_base_action_value(source, hand, &base, value, &mut events);
        steps.push((i + 1, events));
    }
    if disconnect {
        let mut events = Vec::new();
        engine.on_source_lost(source, &mut events);
        steps.push((values.len() + 1, events));
    }

    let active = engine
        .cache()
        .iter()
        .map(|(entry, action)| (entry.source, entry.handedness, action.clone()))
        .collect();
    Ok(Simulation { steps, active })
}

fn add_rule(
    profile: &Path,
    base: u32,
    rule: u32,
    criteria: Option<&str>,
    criteria_rule: Option<&str>,
    comparison: ComparisonOp,
) -> anyhow::Result<(AxisType, usize)> {
    let compiled = ProfileDocument::load(profile)?.compile()?;
    let (registry, mut rules) = (compiled.registry, compiled.rules);
    let mut editor = RuleEditor::new();
    editor.select_base_action(&registry, ActionId(base))?;
    editor.select_rule_action(&registry, ActionId(rule))?;
    let axis = editor.base_action().axis_constraint;
    if let Some(raw) = criteria {
        editor.set_criteria(parse_value(axis, raw)?)?;
    }
    if let Some(raw) = criteria_rule {
        editor.set_use_criteria_rule(true);
        editor.set_criteria_rule(parse_value(axis, raw)?)?;
        editor.set_comparison(comparison)?;
    }
    let index = editor.add_rule(&mut rules)?;
    ProfileDocument::from_parts(&registry, &rules).save(profile)?;
    Ok((axis, index))
}

fn remove_rule(profile: &Path, axis: AxisType, index: usize) -> anyhow::Result<AnyRule> {
    let compiled = ProfileDocument::load(profile)?.compile()?;
    let (registry, mut rules) = (compiled.registry, compiled.rules);
    let removed = RuleEditor::new().remove_rule(&mut rules, axis, index)?;
    ProfileDocument::from_parts(&registry, &rules).save(profile)?;
    Ok(removed)
}

fn describe_rule(rule: &AnyRule) -> String {
    format!(
        "{} {} -> {} when {}",
        partition_name(&rule.axis_type()),
        rule.base_action(),
        rule.rule_action(),
        rule.criteria()
    )
}

fn print_event(step: usize, event: &RuleEvent) {
    match event {
        RuleEvent::Raised {
            source,
            handedness,
            action,
            value,
        } => println!("step {step}: raise {action} on {source}/{handedness} value={value}"),
        RuleEvent::Released {
            source,
            handedness,
            action,
        } => println!("step {step}: release {action} on {source}/{handedness}"),
    }
}

fn parse_value(axis: AxisType, raw: &str) -> anyhow::Result<AxisValue> {
    let floats = |n: usize| -> anyhow::Result<Vec<f32>> {
        let parts = raw
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<f32>()
                    .with_context(|| format!("invalid number '{p}' in '{raw}'"))
            })
            .collect::<anyhow::Result<Vec<f32>>>()?;
        if parts.len() != n {
            bail!("{axis} value needs {n} components, got {} in '{raw}'", parts.len());
        }
        Ok(parts)
    };
    let value = match axis {
        AxisType::Digital => match raw.trim() {
            "true" | "1" | "on" => AxisValue::Digital(true),
            "false" | "0" | "off" => AxisValue::Digital(false),
            other => bail!("invalid digital value '{other}'"),
        },
        AxisType::SingleAxis => AxisValue::SingleAxis(floats(1)?[0]),
        AxisType::DualAxis => {
            let v = floats(2)?;
            AxisValue::DualAxis(Vec2::new(v[0], v[1]))
        }
        AxisType::ThreeDofPosition => {
            let v = floats(3)?;
            AxisValue::Position(Vec3::new(v[0], v[1], v[2]))
        }
        AxisType::ThreeDofRotation => {
            let v = floats(4)?;
            AxisValue::Rotation(Quat::from_xyzw(v[0], v[1], v[2], v[3]))
        }
        AxisType::SixDof => {
            let v = floats(7)?;
            AxisValue::Pose(Pose::new(
                Vec3::new(v[0], v[1], v[2]),
                Quat::from_xyzw(v[3], v[4], v[5], v[6]),
            ))
        }
        AxisType::None | AxisType::Raw => bail!("{axis} actions carry no typed value"),
    };
    Ok(value)
}

fn parse_comparison(raw: &str) -> Result<ComparisonOp, String> {
    match raw {
        "eq" | "==" => Ok(ComparisonOp::Equals),
        "lt" | "<" => Ok(ComparisonOp::LessThan),
        "le" | "<=" => Ok(ComparisonOp::LessThanOrEquals),
        "gt" | ">" => Ok(ComparisonOp::GreaterThan),
        "ge" | ">=" => Ok(ComparisonOp::GreaterThanOrEquals),
        other => Err(format!("unknown comparison '{other}'")),
    }
}

fn parse_partition(raw: &str) -> Result<AxisType, String> {
    AxisType::RULE_AXES
        .into_iter()
        .find(|axis| partition_name(axis) == raw)
        .ok_or_else(|| format!("unknown rule list '{raw}'"))
}
