use crate::record::DerivedMetrics;

/// Smoothed special-teams success rates.
///
/// Both formulas add one to numerator and denominator so a zero-opportunity
/// game stays defined and single-opportunity games do not swing to 0/100.
/// PP_OPP comes from the nested report, so this must run after report mining.
pub fn derive_metrics(pp_gf: f64, pk_ga: f64, pp_opp: u32) -> DerivedMetrics {
    let opportunities = f64::from(pp_opp);
    DerivedMetrics {
        pp_pct: (pp_gf + 1.0) / (opportunities + 1.0) * 100.0,
        pk_pct: ((opportunities - pk_ga) + 1.0) / (opportunities + 1.0) * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_opportunities_stay_defined() {
        let derived = derive_metrics(0.0, 0.0, 0);
        assert_eq!(derived.pp_pct, 100.0);
        assert_eq!(derived.pk_pct, 100.0);
    }

    #[test]
    fn smoothed_power_play_rate() {
        let derived = derive_metrics(3.0, 0.0, 5);
        assert!((derived.pp_pct - 400.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn smoothed_penalty_kill_rate() {
        let derived = derive_metrics(0.0, 1.0, 4);
        assert!((derived.pk_pct - 80.0).abs() < 1e-9);
    }
}
