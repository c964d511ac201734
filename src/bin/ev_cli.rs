//! Short Option EV CLI
//!
//! Ranks a chain of short option candidates by expected value, or evaluates a
//! single option from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use short_option_ev::prelude::*;

#[derive(Parser)]
#[command(name = "ev_cli")]
#[command(about = "Expected value of selling options, ranked from an option chain")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate every quote of a JSON option chain and rank by EV
    Batch {
        /// Option chain file (JSON)
        input: PathBuf,

        /// Evaluation settings file (JSON)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Show only the N best results
        #[arg(long)]
        top: Option<usize>,

        /// Keep delta within "auto" or "min,max"
        #[arg(long)]
        delta_filter: Option<String>,

        /// Fold theta decay into the expected value
        #[arg(long)]
        time_decay: bool,

        /// Print the calculation trace of the best result
        #[arg(long)]
        trace: bool,

        /// Emit the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate one option from its quote and greeks
    Single {
        #[arg(long = "type")]
        option_type: OptionType,
        #[arg(long)]
        underlying: f64,
        #[arg(long)]
        strike: f64,
        #[arg(long)]
        premium: f64,
        #[arg(long)]
        days: i64,
        /// Implied volatility, fraction or percent
        #[arg(long)]
        iv: f64,
        #[arg(long, allow_hyphen_values = true)]
        delta: f64,
        #[arg(long)]
        gamma: f64,
        #[arg(long, allow_hyphen_values = true)]
        theta: f64,
        #[arg(long)]
        vega: f64,
        /// Exercise probability in percent, overrides the delta blend
        #[arg(long)]
        exercise_prob: Option<f64>,
        /// Probability of profit in percent
        #[arg(long)]
        profit_prob: Option<f64>,
        /// Use the numerical integration payout instead of the closed form
        #[arg(long)]
        integrate: bool,
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let outcome = match args.command {
        Command::Batch {
            input,
            config,
            top,
            delta_filter,
            time_decay,
            trace,
            json,
        } => run_batch(BatchOptions {
            input,
            config,
            top,
            delta_filter,
            time_decay,
            trace,
            json,
        }),
        Command::Single {
            option_type,
            underlying,
            strike,
            premium,
            days,
            iv,
            delta,
            gamma,
            theta,
            vega,
            exercise_prob,
            profit_prob,
            integrate,
            json,
        } => {
            let input = CalculatorInput {
                option_type,
                underlying_price: underlying,
                strike,
                premium,
                days_to_expiry: days,
                implied_volatility: iv,
                greeks: Greeks::new(delta, gamma, theta, vega),
                exercise_probability: exercise_prob,
                profit_probability: profit_prob,
            };
            run_single(&input, integrate, json)
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

struct BatchOptions {
    input: PathBuf,
    config: Option<PathBuf>,
    top: Option<usize>,
    delta_filter: Option<String>,
    time_decay: bool,
    trace: bool,
    json: bool,
}

fn run_batch(opts: BatchOptions) -> EvResult<()> {
    let mut config = match &opts.config {
        Some(path) => EvaluationConfig::from_json_file(path)?,
        None => EvaluationConfig::batch(),
    };
    if opts.time_decay {
        config.apply_time_decay = true;
    }

    let chain = load_chain_file(&opts.input)?;
    let evaluator = BatchEvaluator::with_config(config);
    let report = if opts.trace {
        evaluator.evaluate_detailed(&chain.quotes, &chain.context)?
    } else {
        evaluator.evaluate(&chain.quotes, &chain.context)?
    };

    let filter = match opts.delta_filter.as_deref() {
        None => None,
        Some("auto") => DeltaFilter::auto(&chain.quotes),
        Some(range) => Some(parse_delta_range(range)?),
    };

    if opts.json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| EvError::Serialization(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    println!("Short Option EV Ranking");
    println!("=======================\n");
    if let Some(symbol) = &chain.symbol {
        println!("Symbol: {}", symbol);
    }
    println!("Underlying: ${:.2}", report.context.underlying_price);
    println!("Days to expiry: {}", report.context.days_to_expiry);
    println!("Payout model: {}", report.payout_model.label());
    println!(
        "Evaluated: {} of {} quotes ({} rejected at load)\n",
        report.results.len(),
        report.input_count(),
        chain.rejected.len()
    );

    let rows: Vec<&EvaluationResult> = match &filter {
        Some(f) => {
            println!("Delta filter: {:.3} - {:.3}\n", f.min, f.max);
            report.filtered(f)
        }
        None => report.results.iter().collect(),
    };
    let shown = opts.top.unwrap_or(rows.len()).min(rows.len());

    println!(
        "{:>4} {:>5} {:>9} {:>8} {:>7} {:>7} {:>9} {:>9} {:>7}  {}",
        "#", "Type", "Strike", "Premium", "Delta", "P(ex)", "Payout", "EV", "R/R", "Advice"
    );
    println!("{}", "-".repeat(90));
    for (rank, r) in rows.iter().take(shown).enumerate() {
        println!(
            "{:>4} {:>5} {:>9.2} {:>8.2} {:>7.3} {:>6.1}% {:>9.2} {:>9.2} {:>7.2}  {}",
            rank + 1,
            r.option_type.label(),
            r.strike,
            r.premium,
            r.delta,
            r.exercise_probability * 100.0,
            r.potential_payout,
            r.expected_value,
            r.risk_reward_ratio,
            r.recommendation.label()
        );
    }

    if !report.diagnostics.is_empty() {
        println!("\nSkipped quotes:");
        for d in &report.diagnostics {
            println!("  #{} {} {:.2}: {}", d.index, d.option_type, d.strike, d.reason);
        }
    }

    if opts.trace {
        if let Some(best) = rows.first() {
            if let Some(trace) = report.trace_for(best.index) {
                println!(
                    "\nBest: {} {:.2}, time-value screen {:.4}",
                    best.option_type, best.strike, best.time_value_screen
                );
                print_trace(trace);
            }
        }
    }

    Ok(())
}

fn run_single(input: &CalculatorInput, integrate: bool, json: bool) -> EvResult<()> {
    let calculator = if integrate {
        OptionCalculator::with_config(EvaluationConfig::batch())
    } else {
        OptionCalculator::new()
    };
    let calc = calculator.calculate(input)?;

    if json {
        let text = serde_json::to_string_pretty(&calc).map_err(|e| EvError::Serialization(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    let r = &calc.result;
    println!("Short {} {:.2}", r.option_type, r.strike);
    println!("==================\n");
    println!("  Moneyness: {}", r.moneyness.label());
    println!("  Premium: ${:.2} (intrinsic {:.2}, time {:.2})", r.premium, r.intrinsic_value, r.time_value);
    println!("  Exercise probability: {:.2}%", r.exercise_probability * 100.0);
    println!("  Potential payout: ${:.2} ({})", r.potential_payout, r.payout_model.label());
    println!("  Premium component: {:.4}", r.premium_component);
    println!("  Payout component: {:.4}", r.payout_component);
    if r.time_decay != 0.0 {
        println!("  Time decay: {:.4}", r.time_decay);
    }
    println!("  Expected value: ${:.4}", r.expected_value);
    println!("  Risk/reward: {:.2}", r.risk_reward_ratio);
    println!("  Advice: {}", r.recommendation.label());
    println!("  Time-value screen: {:.4}", r.time_value_screen);
    println!("\nRisk Guidance:");
    println!("  Stop loss (underlying): ${:.2}", calc.risk.stop_loss_price);
    println!("  Max position: {:.1}% of account", calc.risk.max_position_pct);

    print_trace(&calc.trace);
    Ok(())
}

fn print_trace(trace: &EvaluationTrace) {
    println!("\nCalculation Trace:");
    println!("  Annualized time: {:.5}", trace.annualized_time);
    println!("  Implied vol: {:.2}%", trace.implied_volatility * 100.0);
    println!("  Expected move (1σ): ${:.2}", trace.distribution.std);
    for band in &trace.sigma_bands {
        println!(
            "  ±{}σ: ${:.2} - ${:.2} ({:.2}%)",
            band.sigmas, band.lower, band.upper, band.coverage
        );
    }
    println!("  Break probability (chart): {:.2}%", trace.chart_break_probability * 100.0);
    if let (Some(first), Some(last)) = (trace.density_curve.first(), trace.density_curve.last()) {
        let peak = trace
            .density_curve
            .iter()
            .map(|p| p.density)
            .fold(0.0_f64, f64::max);
        println!(
            "  Density curve: {} points over ${:.2} - ${:.2}, peak {:.5}",
            trace.density_curve.len(),
            first.price,
            last.price,
            peak
        );
    }
    match &trace.payout.detail {
        PayoutDetail::Integration(i) => {
            println!(
                "  Integration: {} steps over ${:.2} - ${:.2}, expected loss {:.4}, intrinsic {:.4}",
                i.steps, i.lower_bound, i.upper_bound, i.expected_loss, i.intrinsic_component
            );
        }
        PayoutDetail::Heuristic(h) => {
            println!(
                "  Closed form: delta risk {:.4}, gamma risk {:.4}, vol risk {:.4}, intrinsic {:.4}",
                h.delta_risk, h.gamma_risk, h.volatility_risk, h.intrinsic_component
            );
        }
    }
}

fn parse_delta_range(text: &str) -> EvResult<DeltaFilter> {
    let (min, max) = text
        .split_once(',')
        .ok_or_else(|| EvError::invalid_field("delta filter", format!("expected min,max or auto, got {:?}", text)))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|_| EvError::invalid_field("delta filter", format!("{:?} is not a number", s)))
    };
    Ok(DeltaFilter::new(parse(min)?, parse(max)?))
}
