//! BatchEvaluator - Main facade for evaluating an option chain
//!
//! Runs every quote through exercise probability, payout and EV aggregation,
//! skips quotes that fail, and ranks the rest by expected value.

use serde::{Deserialize, Serialize};

use crate::core::error::{require_finite, require_positive};
use crate::core::{EvError, EvResult, Greeks, MarketContext, Moneyness, OptionQuote, OptionType};
use crate::models::{
    annualized_time, check_premium, normalize_implied_vol, time_value_screen, DensityPoint, EvBreakdown,
    ExerciseBreakdown, PayoutEstimate, PayoutInputs, PayoutModel, PriceDistribution, SigmaBand,
};

use super::{DeltaFilter, EvaluationConfig, Recommendation};

/// Largest implied volatility accepted after normalization (500%)
pub const MAX_IMPLIED_VOL: f64 = 5.0;

/// Evaluation of one short option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Position of the quote in the input batch
    pub index: usize,
    pub option_type: OptionType,
    pub strike: f64,
    pub premium: f64,
    pub delta: f64,
    pub moneyness: Moneyness,
    pub intrinsic_value: f64,
    /// Premium minus intrinsic value, may be negative
    pub time_value: f64,
    pub exercise_probability: f64,
    pub no_exercise_probability: f64,
    pub potential_payout: f64,
    pub premium_component: f64,
    pub payout_component: f64,
    /// Theta decay folded into the EV, 0 unless enabled
    pub time_decay: f64,
    pub expected_value: f64,
    pub risk_reward_ratio: f64,
    pub recommendation: Recommendation,
    pub payout_model: PayoutModel,
    /// Quick |delta|-weighted screen over time value, independent of the payout model
    pub time_value_screen: f64,
}

/// Intermediate values behind an [`EvaluationResult`], for display and debugging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTrace {
    pub index: usize,
    pub underlying_price: f64,
    pub days_to_expiry: u32,
    /// Days / trading days per year
    pub annualized_time: f64,
    /// Implied volatility after normalization
    pub implied_volatility: f64,
    /// Terminal price distribution, `N(S, S·σ·√T)`
    pub distribution: PriceDistribution,
    pub sigma_bands: [SigmaBand; 3],
    /// 201 points covering ±3σ and the strike
    pub density_curve: Vec<DensityPoint>,
    /// `1 − Φ(|K − S| / std)`, for charts
    pub chart_break_probability: f64,
    pub exercise: ExerciseBreakdown,
    pub payout: PayoutEstimate,
    pub breakdown: EvBreakdown,
}

/// A quote that was skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationDiagnostic {
    pub index: usize,
    pub option_type: OptionType,
    pub strike: f64,
    pub reason: String,
}

/// Outcome of a batch evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub context: MarketContext,
    pub payout_model: PayoutModel,
    /// Successful evaluations, EV descending, ties in input order
    pub results: Vec<EvaluationResult>,
    /// Traces aligned with `results`; empty unless requested
    pub traces: Vec<EvaluationTrace>,
    /// Quotes that were skipped, in input order
    pub diagnostics: Vec<EvaluationDiagnostic>,
}

impl BatchReport {
    /// Number of quotes submitted
    pub fn input_count(&self) -> usize {
        self.results.len() + self.diagnostics.len()
    }

    /// Highest-EV result
    pub fn best(&self) -> Option<&EvaluationResult> {
        self.results.first()
    }

    /// Results whose delta lies inside the window, in ranked order
    pub fn filtered(&self, filter: &DeltaFilter) -> Vec<&EvaluationResult> {
        self.results.iter().filter(|r| filter.contains(r.delta)).collect()
    }

    /// Trace for the quote at the given input index
    pub fn trace_for(&self, index: usize) -> Option<&EvaluationTrace> {
        self.traces.iter().find(|t| t.index == index)
    }
}

/// Inputs shared by the batch and single-option paths, already validated
#[derive(Debug, Clone, Copy)]
pub(crate) struct PricingInputs {
    pub option_type: OptionType,
    pub strike: f64,
    pub premium: f64,
    pub underlying: f64,
    pub days_to_expiry: u32,
    /// Fraction, normalized once at the boundary
    pub implied_vol: f64,
    pub greeks: Greeks,
}

/// Validate a raw IV quote and bring it to fraction scale
pub(crate) fn normalized_implied_vol(raw: f64) -> EvResult<f64> {
    require_positive("implied volatility", raw)?;
    let iv = normalize_implied_vol(raw);
    if iv > MAX_IMPLIED_VOL {
        return Err(EvError::invalid_field(
            "implied volatility",
            format!("must be at most 500%, got {:.1}%", iv * 100.0),
        ));
    }
    Ok(iv)
}

/// A priced quote; the trace is only assembled on request
pub(crate) struct Priced {
    pub result: EvaluationResult,
    time: f64,
    implied_vol: f64,
    underlying: f64,
    days_to_expiry: u32,
    sigma: f64,
    exercise: ExerciseBreakdown,
    payout: PayoutEstimate,
    breakdown: EvBreakdown,
}

impl Priced {
    pub fn into_traced(self) -> (EvaluationResult, EvaluationTrace) {
        let distribution = PriceDistribution::new(self.underlying, self.sigma);
        let strike = self.result.strike;
        let trace = EvaluationTrace {
            index: self.result.index,
            underlying_price: self.underlying,
            days_to_expiry: self.days_to_expiry,
            annualized_time: self.time,
            implied_volatility: self.implied_vol,
            distribution,
            sigma_bands: distribution.sigma_bands(),
            density_curve: distribution.density_curve(strike),
            chart_break_probability: distribution.break_probability(strike),
            exercise: self.exercise,
            payout: self.payout,
            breakdown: self.breakdown,
        };
        (self.result, trace)
    }
}

/// Price validated inputs with the configured payout model
pub(crate) fn price_inputs(
    index: usize,
    inputs: &PricingInputs,
    exercise: ExerciseBreakdown,
    config: &EvaluationConfig,
) -> EvResult<Priced> {
    let time = annualized_time(inputs.days_to_expiry, config.trading_days_per_year);

    let payout_inputs = PayoutInputs {
        option_type: inputs.option_type,
        underlying: inputs.underlying,
        strike: inputs.strike,
        premium: inputs.premium,
        implied_vol: inputs.implied_vol,
        time,
        delta: inputs.greeks.delta,
        gamma: inputs.greeks.gamma,
    };
    let payout = config.payout_model.estimate(&payout_inputs, &config.integration);

    let mut breakdown = EvBreakdown::combine(exercise.probability, payout.payout, inputs.premium)?;
    if config.apply_time_decay {
        breakdown = breakdown.with_time_decay(
            inputs.greeks.theta,
            inputs.days_to_expiry,
            config.calendar_days_per_year,
        );
        breakdown.ensure_finite()?;
    }

    let screen_quote = OptionQuote::new(inputs.option_type, inputs.strike, inputs.premium).with_greeks(inputs.greeks);
    let screen_ctx = MarketContext {
        underlying_price: inputs.underlying,
        days_to_expiry: inputs.days_to_expiry,
    };

    let intrinsic_value = payout_inputs.intrinsic();
    let result = EvaluationResult {
        index,
        option_type: inputs.option_type,
        strike: inputs.strike,
        premium: inputs.premium,
        delta: inputs.greeks.delta,
        moneyness: payout_inputs.moneyness(),
        intrinsic_value,
        time_value: inputs.premium - intrinsic_value,
        exercise_probability: breakdown.exercise_probability,
        no_exercise_probability: breakdown.no_exercise_probability,
        potential_payout: breakdown.potential_payout,
        premium_component: breakdown.premium_component,
        payout_component: breakdown.payout_component,
        time_decay: breakdown.time_decay,
        expected_value: breakdown.expected_value,
        risk_reward_ratio: breakdown.risk_reward_ratio,
        recommendation: Recommendation::classify(breakdown.expected_value, breakdown.risk_reward_ratio),
        payout_model: payout.model,
        time_value_screen: time_value_screen(&screen_quote, &screen_ctx),
    };

    Ok(Priced {
        result,
        time,
        implied_vol: inputs.implied_vol,
        underlying: inputs.underlying,
        days_to_expiry: inputs.days_to_expiry,
        sigma: payout_inputs.sigma(),
        exercise,
        payout,
        breakdown,
    })
}

/// Main evaluator for a batch of quotes sharing one market context
pub struct BatchEvaluator {
    config: EvaluationConfig,
}

impl BatchEvaluator {
    /// Create a new evaluator with the batch configuration
    pub fn new() -> Self {
        Self {
            config: EvaluationConfig::batch(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(config: EvaluationConfig) -> Self {
        Self { config }
    }

    /// Get current configuration
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluate one quote
    pub fn evaluate_quote(
        &self,
        index: usize,
        quote: &OptionQuote,
        ctx: &MarketContext,
    ) -> EvResult<(EvaluationResult, EvaluationTrace)> {
        Ok(self.price_quote(index, quote, ctx)?.into_traced())
    }

    fn price_quote(&self, index: usize, quote: &OptionQuote, ctx: &MarketContext) -> EvResult<Priced> {
        let inputs = prepare_quote(quote, ctx)?;
        let exercise = ExerciseBreakdown::blend(quote.greeks.delta, quote.profit_probability);
        price_inputs(index, &inputs, exercise, &self.config)
    }

    /// Evaluate and rank a batch
    ///
    /// Fails only when the context or configuration is unusable; individual
    /// quotes that fail are reported in `diagnostics`.
    pub fn evaluate(&self, quotes: &[OptionQuote], ctx: &MarketContext) -> EvResult<BatchReport> {
        self.run(quotes, ctx, false)
    }

    /// Like [`evaluate`](Self::evaluate), keeping a trace for every result
    pub fn evaluate_detailed(&self, quotes: &[OptionQuote], ctx: &MarketContext) -> EvResult<BatchReport> {
        self.run(quotes, ctx, true)
    }

    fn run(&self, quotes: &[OptionQuote], ctx: &MarketContext, keep_traces: bool) -> EvResult<BatchReport> {
        self.config.validate()?;
        ctx.validate()?;

        let mut evaluated = Vec::with_capacity(quotes.len());
        let mut diagnostics = Vec::new();

        for (index, quote) in quotes.iter().enumerate() {
            match self.price_quote(index, quote, ctx) {
                Ok(priced) => {
                    let (result, trace) = if keep_traces {
                        let (result, trace) = priced.into_traced();
                        (result, Some(trace))
                    } else {
                        (priced.result, None)
                    };
                    tracing::debug!(
                        index,
                        quote = %quote.describe(),
                        exercise_probability = result.exercise_probability,
                        potential_payout = result.potential_payout,
                        expected_value = result.expected_value,
                        "evaluated quote"
                    );
                    evaluated.push((result, trace));
                }
                Err(e) => {
                    tracing::warn!(index, quote = %quote.describe(), "Skipping quote: {}", e);
                    diagnostics.push(EvaluationDiagnostic {
                        index,
                        option_type: quote.option_type,
                        strike: quote.strike,
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Stable: equal EVs keep input order
        evaluated.sort_by(|(a, _), (b, _)| {
            b.expected_value
                .partial_cmp(&a.expected_value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let (results, traces): (Vec<_>, Vec<_>) = evaluated.into_iter().unzip();
        let traces: Vec<EvaluationTrace> = traces.into_iter().flatten().collect();

        tracing::info!(
            evaluated = results.len(),
            skipped = diagnostics.len(),
            model = self.config.payout_model.label(),
            "Batch evaluation complete"
        );

        Ok(BatchReport {
            context: *ctx,
            payout_model: self.config.payout_model,
            results,
            traces,
            diagnostics,
        })
    }
}

impl Default for BatchEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-quote checks for the batch path
fn prepare_quote(quote: &OptionQuote, ctx: &MarketContext) -> EvResult<PricingInputs> {
    require_positive("strike", quote.strike)?;
    let premium = check_premium(quote.premium())?;
    quote.greeks.validate()?;
    require_finite("profit probability", quote.profit_probability)?;
    let implied_vol = normalized_implied_vol(quote.implied_volatility)?;

    Ok(PricingInputs {
        option_type: quote.option_type,
        strike: quote.strike,
        premium,
        underlying: ctx.underlying_price,
        days_to_expiry: ctx.days_to_expiry,
        implied_vol,
        greeks: quote.greeks,
    })
}

/// Convenience function to evaluate a batch with the default configuration
pub fn evaluate_batch(quotes: &[OptionQuote], ctx: &MarketContext) -> EvResult<BatchReport> {
    BatchEvaluator::new().evaluate(quotes, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PayoutDetail;

    fn quote(option_type: OptionType, strike: f64, premium: f64, delta: f64, profit: f64) -> OptionQuote {
        OptionQuote::new(option_type, strike, premium)
            .with_greeks(Greeks::new(delta, 0.01, -0.05, 0.1))
            .with_implied_volatility(0.30)
            .with_profit_probability(profit)
    }

    fn context() -> MarketContext {
        MarketContext::new(340.0, 6).unwrap()
    }

    #[test]
    fn test_reference_call() {
        let evaluator = BatchEvaluator::new();
        let (result, trace) = evaluator
            .evaluate_quote(0, &quote(OptionType::Call, 350.0, 2.5, 0.25, 30.0), &context())
            .unwrap();

        assert!((trace.annualized_time - 6.0 / 252.0).abs() < 1e-15);
        assert!((trace.distribution.std - 15.73).abs() < 0.02);
        assert!((result.exercise_probability - 0.26).abs() < 1e-12);
        assert_eq!(result.moneyness, Moneyness::Otm);
        assert!(result.expected_value > 0.0 && result.expected_value < 2.5);
        assert!(result.risk_reward_ratio.is_finite() && result.risk_reward_ratio > 0.0);
        assert_eq!(result.recommendation, Recommendation::Recommended);
    }

    #[test]
    fn test_iv_percent_scale() {
        let evaluator = BatchEvaluator::new();
        let ctx = context();
        let fraction = quote(OptionType::Call, 350.0, 2.5, 0.25, 30.0);
        let percent = fraction.clone().with_implied_volatility(30.0);

        let (a, _) = evaluator.evaluate_quote(0, &fraction, &ctx).unwrap();
        let (b, tb) = evaluator.evaluate_quote(0, &percent, &ctx).unwrap();
        assert_eq!(a.expected_value, b.expected_value);
        assert_eq!(tb.implied_volatility, 0.30);
    }

    #[test]
    fn test_deep_otm_keeps_premium() {
        let q = quote(OptionType::Call, 500.0, 0.5, 0.01, 1.0).with_implied_volatility(0.2);
        let (result, _) = BatchEvaluator::new().evaluate_quote(0, &q, &context()).unwrap();

        assert_eq!(result.potential_payout, 0.0);
        assert!((result.expected_value - 0.5).abs() < 0.5 * 0.02);
    }

    #[test]
    fn test_deep_itm_payout_covers_intrinsic() {
        let q = quote(OptionType::Call, 250.0, 91.0, 0.99, 5.0);
        let (result, _) = BatchEvaluator::new().evaluate_quote(0, &q, &context()).unwrap();

        assert_eq!(result.intrinsic_value, 90.0);
        assert!(result.potential_payout >= result.intrinsic_value);
        assert!(result.expected_value < 0.0);
    }

    #[test]
    fn test_batch_skips_zero_premium() {
        let quotes = vec![
            quote(OptionType::Call, 360.0, 1.0, 0.10, 15.0),
            quote(OptionType::Put, 330.0, 0.0, -0.25, 30.0),
            quote(OptionType::Call, 350.0, 2.5, 0.25, 30.0),
        ];

        let report = evaluate_batch(&quotes, &context()).unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.input_count(), 3);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].index, 1);
        assert!(report.diagnostics[0].reason.contains("Zero premium"));

        assert!(report.results[0].expected_value >= report.results[1].expected_value);
        assert_eq!(report.results[0].strike, 350.0);
        assert_eq!(report.results[1].strike, 360.0);
        assert_eq!(report.best().unwrap().index, 2);
        assert!(report.traces.is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let same = quote(OptionType::Call, 360.0, 1.0, 0.10, 15.0);
        let better = quote(OptionType::Call, 350.0, 2.5, 0.25, 30.0);
        let quotes = vec![same.clone(), same.clone(), better, same];

        let report = evaluate_batch(&quotes, &context()).unwrap();
        let order: Vec<usize> = report.results.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_bad_greeks_skipped() {
        let mut missing_delta = quote(OptionType::Put, 330.0, 2.0, -0.25, 30.0);
        missing_delta.greeks.delta = f64::NAN;
        let quotes = vec![missing_delta, quote(OptionType::Put, 320.0, 1.0, -0.12, 20.0)];

        let report = evaluate_batch(&quotes, &context()).unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].index, 1);
        assert!(report.diagnostics[0].reason.contains("delta"));
    }

    #[test]
    fn test_invalid_context_fails_batch() {
        let ctx = MarketContext {
            underlying_price: -1.0,
            days_to_expiry: 6,
        };
        assert!(evaluate_batch(&[quote(OptionType::Call, 350.0, 2.5, 0.25, 30.0)], &ctx).is_err());
    }

    #[test]
    fn test_traces_match_results() {
        let quotes = vec![
            quote(OptionType::Call, 360.0, 1.0, 0.10, 15.0),
            quote(OptionType::Call, 350.0, 2.5, 0.25, 30.0),
            quote(OptionType::Put, 345.0, 7.0, -0.55, 40.0),
        ];
        let ctx = context();
        let evaluator = BatchEvaluator::new();

        let plain = evaluator.evaluate(&quotes, &ctx).unwrap();
        let detailed = evaluator.evaluate_detailed(&quotes, &ctx).unwrap();
        assert_eq!(plain.results, detailed.results);
        assert_eq!(detailed.traces.len(), detailed.results.len());

        for (result, trace) in detailed.results.iter().zip(&detailed.traces) {
            assert_eq!(result.index, trace.index);
            assert_eq!(result.expected_value, trace.breakdown.expected_value);
            assert_eq!(result.potential_payout, trace.payout.payout);
            assert_eq!(result.exercise_probability, trace.exercise.probability);

            match &trace.payout.detail {
                PayoutDetail::Integration(o) => {
                    assert_eq!(o.sigma, trace.distribution.std);
                    assert_eq!(o.intrinsic_component + o.expected_loss, result.potential_payout);
                }
                other => panic!("unexpected payout detail {:?}", other),
            }
        }
        assert!(detailed.trace_for(2).is_some());
    }

    #[test]
    fn test_screen_and_density_curve() {
        let ctx = context();
        let q = quote(OptionType::Put, 345.0, 7.0, -0.55, 40.0);

        let (result, trace) = BatchEvaluator::new().evaluate_quote(0, &q, &ctx).unwrap();
        assert_eq!(result.time_value_screen, time_value_screen(&q, &ctx));

        assert_eq!(trace.density_curve.len(), 201);
        assert_eq!(trace.density_curve, trace.distribution.density_curve(345.0));

        // Ranking without traces still carries the screen
        let report = evaluate_batch(&[q], &ctx).unwrap();
        assert!(report.traces.is_empty());
        assert_eq!(report.results[0].time_value_screen, result.time_value_screen);
    }

    #[test]
    fn test_time_decay_config() {
        let q = quote(OptionType::Call, 350.0, 2.5, 0.25, 30.0);
        let ctx = context();

        let (plain, _) = BatchEvaluator::new().evaluate_quote(0, &q, &ctx).unwrap();
        let (decayed, _) = BatchEvaluator::with_config(EvaluationConfig::with_time_decay())
            .evaluate_quote(0, &q, &ctx)
            .unwrap();

        let expected_decay = -0.05 * (6.0 / 365.0);
        assert!((decayed.time_decay - expected_decay).abs() < 1e-15);
        assert!((decayed.expected_value - (plain.expected_value + expected_decay)).abs() < 1e-12);
    }

    #[test]
    fn test_closed_form_model_in_batch() {
        let quotes = vec![quote(OptionType::Call, 350.0, 2.5, 0.25, 30.0)];
        let report = BatchEvaluator::with_config(EvaluationConfig::calculator())
            .evaluate_detailed(&quotes, &context())
            .unwrap();

        assert_eq!(report.payout_model, PayoutModel::ClosedFormHeuristic);
        assert!(matches!(report.traces[0].payout.detail, PayoutDetail::Heuristic(_)));
    }

    #[test]
    fn test_delta_filter_view() {
        let quotes = vec![
            quote(OptionType::Call, 350.0, 2.5, 0.25, 30.0),
            quote(OptionType::Call, 335.0, 8.0, 0.62, 50.0),
            quote(OptionType::Put, 330.0, 2.2, -0.22, 30.0),
        ];
        let report = evaluate_batch(&quotes, &context()).unwrap();
        let filter = DeltaFilter::auto(&quotes).unwrap();

        let kept = report.filtered(&filter);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.delta.abs() <= 0.4));
        assert_eq!(report.results.len(), 3);
    }
}
