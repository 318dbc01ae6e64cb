use crate::reference_resolution::BindingStats;

/// Counters for one classification request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    pub bytes: usize,
    pub lexemes: usize,
    pub nodes: usize,
    pub spans: usize,
    pub embedded_literals: usize,
    /// `None` when the semantic pass was disabled
    pub binding: Option<BindingStats>,
    pub lex_ms: f64,
    pub parse_ms: f64,
    pub classify_ms: f64,
    pub validate_ms: f64,
}

impl PipelineStats {
    pub fn total_ms(&self) -> f64 {
        self.lex_ms + self.parse_ms + self.classify_ms + self.validate_ms
    }

    /// Bytes per second over all stages
    pub fn processing_rate(&self) -> f64 {
        let total = self.total_ms();
        if total > 0.0 {
            self.bytes as f64 / (total / 1000.0)
        } else {
            0.0
        }
    }

    /// Share of visited names the binder resolved
    pub fn resolution_rate(&self) -> Option<f64> {
        self.binding.as_ref().map(|binding| {
            if binding.names_visited == 0 {
                1.0
            } else {
                binding.resolved as f64 / binding.names_visited as f64
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let stats = PipelineStats {
            bytes: 2_000,
            lex_ms: 1.0,
            parse_ms: 1.0,
            binding: Some(BindingStats {
                names_visited: 4,
                resolved: 3,
                ..BindingStats::default()
            }),
            ..PipelineStats::default()
        };
        assert_eq!(stats.total_ms(), 2.0);
        assert_eq!(stats.processing_rate(), 1_000_000.0);
        assert_eq!(stats.resolution_rate(), Some(0.75));
        assert_eq!(PipelineStats::default().resolution_rate(), None);
    }
}
