//! The fixed name ↔ index catalog of fitting passes.

use std::fmt;

/// Number of passes in the catalog.
pub const PASS_COUNT: usize = 12;

/// Identifies one of the supported fitting passes.
///
/// The discriminant is the stable index callers select passes by; both the
/// index and [`name`](Self::name) are part of the public contract and never
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassKind {
    DistanceField = 0,
    MlsPlane = 1,
    MlsSphere = 2,
    MlsOrientedSphere = 3,
    MlsUnorientedSphere = 4,
    BestFitPlane = 5,
    BestFitSphere = 6,
    BestFitOrientedSphere = 7,
    OneFitPlane = 8,
    OneFitSphere = 9,
    OneFitOrientedSphere = 10,
    OnePointScale = 11,
}

static_assertions::const_assert_eq!(PassKind::ALL.len(), PASS_COUNT);
static_assertions::const_assert_eq!(PassKind::OnePointScale as usize, PASS_COUNT - 1);

impl PassKind {
    /// Every pass, in index order.
    pub const ALL: [PassKind; PASS_COUNT] = [
        PassKind::DistanceField,
        PassKind::MlsPlane,
        PassKind::MlsSphere,
        PassKind::MlsOrientedSphere,
        PassKind::MlsUnorientedSphere,
        PassKind::BestFitPlane,
        PassKind::BestFitSphere,
        PassKind::BestFitOrientedSphere,
        PassKind::OneFitPlane,
        PassKind::OneFitSphere,
        PassKind::OneFitOrientedSphere,
        PassKind::OnePointScale,
    ];

    /// Stable index of the pass.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable catalog name.
    pub const fn name(self) -> &'static str {
        match self {
            PassKind::DistanceField => "Distance Field",
            PassKind::MlsPlane => "MLS-Plane",
            PassKind::MlsSphere => "MLS-Sphere",
            PassKind::MlsOrientedSphere => "MLS-Oriented Sphere",
            PassKind::MlsUnorientedSphere => "MLS-Unoriented Sphere",
            PassKind::BestFitPlane => "Best Fit-Plane",
            PassKind::BestFitSphere => "Best Fit-Sphere",
            PassKind::BestFitOrientedSphere => "Best Fit-Oriented Sphere",
            PassKind::OneFitPlane => "One Fit-Plane",
            PassKind::OneFitSphere => "One Fit-Sphere",
            PassKind::OneFitOrientedSphere => "One Fit-Oriented Sphere",
            PassKind::OnePointScale => "One Point-Scale",
        }
    }

    /// Looks a pass up by index.
    pub fn from_index(index: usize) -> Option<PassKind> {
        Self::ALL.get(index).copied()
    }

    /// Looks a pass up by catalog name.
    ///
    /// Whitespace around the `-` separator is ignored, so `"MLS - Plane"`
    /// resolves like `"MLS-Plane"`.
    pub fn from_name(name: &str) -> Option<PassKind> {
        let normalized = normalize(name);
        Self::ALL.into_iter().find(|kind| kind.name() == normalized)
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .split('-')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("-")
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn indices_follow_declaration_order() {
        for (i, kind) in PassKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(PassKind::from_index(i), Some(*kind));
        }
        assert_eq!(PassKind::from_index(PASS_COUNT), None);
    }

    #[test]
    fn catalog_is_verbatim() {
        let expected = [
            ("Distance Field", 0),
            ("MLS-Plane", 1),
            ("MLS-Sphere", 2),
            ("MLS-Oriented Sphere", 3),
            ("MLS-Unoriented Sphere", 4),
            ("Best Fit-Plane", 5),
            ("Best Fit-Sphere", 6),
            ("Best Fit-Oriented Sphere", 7),
            ("One Fit-Plane", 8),
            ("One Fit-Sphere", 9),
            ("One Fit-Oriented Sphere", 10),
            ("One Point-Scale", 11),
        ];
        for (name, index) in expected {
            let kind = PassKind::from_name(name).unwrap();
            assert_eq!(kind.index(), index);
            assert_eq!(kind.name(), name);
        }
    }

    #[test]
    fn names_are_unique() {
        let names: HashSet<&str> = PassKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), PASS_COUNT);
    }

    #[test]
    fn spaced_separator_is_accepted() {
        assert_eq!(PassKind::from_name("MLS - Plane"), Some(PassKind::MlsPlane));
        assert_eq!(PassKind::from_name(" One Point - Scale "), Some(PassKind::OnePointScale));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(PassKind::from_name("Unknown"), None);
        assert_eq!(PassKind::from_name(""), None);
        assert_eq!(PassKind::from_name("mls-plane"), None);
        assert_eq!(PassKind::from_name("MLS-Plane-"), None);
    }
}
