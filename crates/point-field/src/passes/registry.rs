//! Ownership of the pass instances and typed dispatch by index.

use crate::config::PassDefaults;

use super::{
    BestOrientedSphereFitField, BestPlaneFitField, BestSphereFitField, Cloud, ConcretePass,
    DistanceFieldFromOnePoint, DistanceFieldWithKdTree, DrawingPass, OneOrientedSphereFitField,
    OnePlaneFitField, OneSphereFitField, OrientedSphereFitField, PASS_COUNT, Parameterized,
    PassKind, PlaneFitField, SphereFitField, UnorientedSphereFitField,
};

/// Receives a pass with its concrete type.
///
/// `visit` is monomorphized per pass type, so implementations can use the
/// associated [`Parameterized::Params`] and [`ConcretePass::KIND`] of `P`
/// without inspecting anything at runtime.
pub trait PassVisitor {
    type Output;

    fn visit<P: ConcretePass>(&mut self, pass: &mut P, cloud: &Cloud<'_>) -> Self::Output;
}

/// Declares [`FittingPass`] and binds each [`PassKind`] to its pass type.
///
/// This table is the only place where kinds and types are paired.
macro_rules! fitting_passes {
    ($($kind:ident => $ty:ty),* $(,)?) => {
        /// One concrete pass, tagged by its catalog entry.
        #[derive(Debug, Clone)]
        pub enum FittingPass {
            $($kind($ty),)*
        }

        $(
            impl ConcretePass for $ty {
                const KIND: PassKind = PassKind::$kind;
            }
        )*

        impl FittingPass {
            /// Creates the pass registered under `kind`.
            pub fn new(kind: PassKind, defaults: &PassDefaults) -> Self {
                match kind {
                    $(PassKind::$kind => {
                        FittingPass::$kind(<$ty as Parameterized>::from_defaults(defaults))
                    })*
                }
            }

            pub fn kind(&self) -> PassKind {
                match self {
                    $(FittingPass::$kind(_) => PassKind::$kind,)*
                }
            }

            /// Uniform access, type erased.
            pub fn as_drawing_pass(&self) -> &dyn DrawingPass {
                match self {
                    $(FittingPass::$kind(pass) => pass,)*
                }
            }

            pub fn as_drawing_pass_mut(&mut self) -> &mut dyn DrawingPass {
                match self {
                    $(FittingPass::$kind(pass) => pass,)*
                }
            }

            /// Hands the concretely typed pass to `visitor`.
            pub fn accept<V: PassVisitor>(
                &mut self,
                cloud: &Cloud<'_>,
                visitor: &mut V,
            ) -> V::Output {
                match self {
                    $(FittingPass::$kind(pass) => visitor.visit(pass, cloud),)*
                }
            }
        }
    };
}

fitting_passes! {
    DistanceField => DistanceFieldWithKdTree,
    MlsPlane => PlaneFitField,
    MlsSphere => SphereFitField,
    MlsOrientedSphere => OrientedSphereFitField,
    MlsUnorientedSphere => UnorientedSphereFitField,
    BestFitPlane => BestPlaneFitField,
    BestFitSphere => BestSphereFitField,
    BestFitOrientedSphere => BestOrientedSphereFitField,
    OneFitPlane => OnePlaneFitField,
    OneFitSphere => OneSphereFitField,
    OneFitOrientedSphere => OneOrientedSphereFitField,
    OnePointScale => DistanceFieldFromOnePoint,
}

/// Owns exactly one instance of every pass, stored at its catalog index.
#[derive(Debug, Clone)]
pub struct PassRegistry {
    passes: [FittingPass; PASS_COUNT],
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::new(&PassDefaults::default())
    }
}

impl PassRegistry {
    /// Creates every pass with the given initial parameters.
    pub fn new(defaults: &PassDefaults) -> Self {
        Self {
            passes: PassKind::ALL.map(|kind| FittingPass::new(kind, defaults)),
        }
    }

    /// Returns the pass stored at `index`, `None` outside the catalog.
    pub fn get(&self, index: usize) -> Option<&FittingPass> {
        self.passes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut FittingPass> {
        self.passes.get_mut(index)
    }

    /// Returns the pass registered under `name`, `None` for unknown names.
    pub fn by_name(&self, name: &str) -> Option<&FittingPass> {
        let kind = PassKind::from_name(name);
        if kind.is_none() {
            log::debug!("unknown drawing pass {name:?}");
        }
        self.get(kind?.index())
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut FittingPass> {
        let kind = PassKind::from_name(name)?;
        self.get_mut(kind.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FittingPass> {
        self.passes.iter()
    }

    /// Refreshes every pass against the current cloud.
    pub fn prepare_all(&mut self, cloud: &Cloud<'_>) {
        for pass in &mut self.passes {
            pass.as_drawing_pass_mut().prepare(cloud);
        }
    }

    /// Resolves `index` and hands the concretely typed pass to `visitor`.
    ///
    /// Returns `None` without calling the visitor when `index` is negative or
    /// outside the catalog.
    pub fn visit_pass<I, V>(
        &mut self,
        index: I,
        cloud: &Cloud<'_>,
        visitor: &mut V,
    ) -> Option<V::Output>
    where
        I: TryInto<usize>,
        V: PassVisitor,
    {
        let pass = self.passes.get_mut(index.try_into().ok()?)?;
        Some(pass.accept(cloud, visitor))
    }

    /// Like [`visit_pass`](Self::visit_pass), reporting only whether the
    /// index was valid.
    pub fn process_pass<I, V>(&mut self, index: I, cloud: &Cloud<'_>, visitor: &mut V) -> bool
    where
        I: TryInto<usize>,
        V: PassVisitor,
    {
        self.visit_pass(index, cloud, visitor).is_some()
    }
}
