/// Resolution preset. Each step up shrinks the grid spacing, which grows
/// both the grid and the seeded particle count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
    Ultra,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::Low, Quality::Medium, Quality::High, Quality::Ultra];

    /// World-space distance between neighbouring grid nodes.
    pub const fn grid_spacing(self) -> f32 {
        match self {
            Quality::Low => 0.5,
            Quality::Medium => 0.4,
            Quality::High => 0.3,
            Quality::Ultra => 0.2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
            Quality::Ultra => "ultra",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_shrinks_with_quality() {
        let spacings: Vec<f32> = Quality::ALL.iter().map(|q| q.grid_spacing()).collect();
        assert_eq!(spacings, vec![0.5, 0.4, 0.3, 0.2]);
    }
}
