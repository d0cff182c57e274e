//! Factory registry mapping check ids to check constructors.

use ahash::{HashMap, HashMapExt};

use geocheck_types::GeometryType;

use crate::check::dangle::DangleCheck;
use crate::check::gap::GapCheck;
use crate::check::hole::HoleCheck;
use crate::check::overlap::OverlapCheck;
use crate::check::self_intersection::SelfIntersectionCheck;
use crate::check::sliver::SliverCheck;
use crate::check::{CheckConfiguration, GeometryCheck};
use crate::context::CheckContext;
use crate::error::GeocheckError;
use crate::pool::{FeaturePool, FeaturePools};

/// Constructor of one kind of check, registered under the check's stable id.
pub trait CheckFactory: Send + Sync {
    /// Id of the checks this factory creates.
    fn id(&self) -> &'static str;

    /// Human-readable description of the check.
    fn description(&self) -> &'static str;

    /// Geometry types the created checks can run against.
    fn compatible_geometry_types(&self) -> &'static [GeometryType];

    /// Whether the check can run against the given layer.
    fn is_compatible(&self, pool: &dyn FeaturePool) -> bool {
        self.compatible_geometry_types()
            .contains(&pool.geometry_type())
    }

    /// Creates a check instance for one checking run.
    fn create(
        &self,
        context: &CheckContext,
        configuration: &CheckConfiguration,
    ) -> Box<dyn GeometryCheck>;
}

macro_rules! check_factory {
    ($factory:ident, $check:ident, $description:literal, [$($geom_type:ident),+]) => {
        #[doc = concat!("Factory for [`", stringify!($check), "`].")]
        pub struct $factory;

        impl CheckFactory for $factory {
            fn id(&self) -> &'static str {
                $check::ID
            }

            fn description(&self) -> &'static str {
                $description
            }

            fn compatible_geometry_types(&self) -> &'static [GeometryType] {
                &[$(GeometryType::$geom_type),+]
            }

            fn create(
                &self,
                context: &CheckContext,
                configuration: &CheckConfiguration,
            ) -> Box<dyn GeometryCheck> {
                Box::new($check::new(context, configuration))
            }
        }
    };
}

check_factory!(DangleCheckFactory, DangleCheck, "Dangle", [Line]);
check_factory!(GapCheckFactory, GapCheck, "Gap", [Polygon]);
check_factory!(HoleCheckFactory, HoleCheck, "Polygon with hole", [Polygon]);
check_factory!(OverlapCheckFactory, OverlapCheck, "Overlap", [Polygon]);
check_factory!(
    SelfIntersectionCheckFactory,
    SelfIntersectionCheck,
    "Self intersection",
    [Line, Polygon]
);
check_factory!(SliverCheckFactory, SliverCheck, "Sliver polygon", [Polygon]);

/// Registry of check factories.
///
/// An explicit value rather than a process-wide singleton: different checker instances can carry
/// different registries (e.g. with project-specific checks added).
#[derive(Default)]
pub struct CheckRegistry {
    factories: HashMap<String, Box<dyn CheckFactory>>,
}

impl CheckRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry with all built-in checks registered.
    pub fn with_builtin_checks() -> Self {
        let mut registry = Self::new();
        let factories: Vec<Box<dyn CheckFactory>> = vec![
            Box::new(DangleCheckFactory),
            Box::new(GapCheckFactory),
            Box::new(HoleCheckFactory),
            Box::new(OverlapCheckFactory),
            Box::new(SelfIntersectionCheckFactory),
            Box::new(SliverCheckFactory),
        ];
        for factory in factories {
            registry
                .register(factory)
                .expect("built-in check ids are distinct");
        }
        registry
    }

    /// Registers a factory. A second factory under an already registered id is rejected.
    pub fn register(&mut self, factory: Box<dyn CheckFactory>) -> Result<(), GeocheckError> {
        let id = factory.id();
        if self.factories.contains_key(id) {
            return Err(GeocheckError::DuplicateCheckId(id.to_string()));
        }
        self.factories.insert(id.to_string(), factory);
        Ok(())
    }

    /// The factory registered under the given id, if any.
    pub fn factory(&self, id: &str) -> Option<&dyn CheckFactory> {
        self.factories.get(id).map(|factory| factory.as_ref())
    }

    /// Ids of all registered factories, in ascending order.
    pub fn check_ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.factories.keys().map(|id| id.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Ids of the factories whose checks can run against the given layer, in ascending order.
    pub fn compatible_check_ids(&self, pool: &dyn FeaturePool) -> Vec<&str> {
        let mut ids: Vec<_> = self
            .factories
            .values()
            .filter(|factory| factory.is_compatible(pool))
            .map(|factory| factory.id())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Creates a check instance by id.
    pub fn create_check(
        &self,
        id: &str,
        context: &CheckContext,
        configuration: &CheckConfiguration,
    ) -> Result<Box<dyn GeometryCheck>, GeocheckError> {
        let factory = self
            .factory(id)
            .ok_or_else(|| GeocheckError::UnknownCheckId(id.to_string()))?;
        Ok(factory.create(context, configuration))
    }

    /// Creates a check instance by id after verifying that each of the named layers exists and is
    /// compatible with the check.
    pub fn create_check_for_layers(
        &self,
        id: &str,
        context: &CheckContext,
        configuration: &CheckConfiguration,
        pools: &FeaturePools,
        layer_ids: &[String],
    ) -> Result<Box<dyn GeometryCheck>, GeocheckError> {
        let factory = self
            .factory(id)
            .ok_or_else(|| GeocheckError::UnknownCheckId(id.to_string()))?;
        for layer_id in layer_ids {
            let pool = pools
                .get(layer_id)
                .ok_or_else(|| GeocheckError::UnknownLayer(layer_id.clone()))?;
            if !factory.is_compatible(pool.as_ref()) {
                return Err(GeocheckError::IncompatibleLayer {
                    check_id: id.to_string(),
                    layer_id: layer_id.clone(),
                });
            }
        }
        Ok(factory.create(context, configuration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use geocheck_types::Crs;
    use crate::pool::MemoryFeaturePool;

    fn context() -> CheckContext {
        CheckContext::new(0.001, Crs::new("EPSG:3857"))
    }

    #[test]
    fn builtin_checks_are_registered() {
        let registry = CheckRegistry::with_builtin_checks();
        assert_eq!(
            registry.check_ids(),
            vec![
                "DangleCheck",
                "GapCheck",
                "HoleCheck",
                "OverlapCheck",
                "SelfIntersectionCheck",
                "SliverCheck",
            ]
        );
        let check = registry
            .create_check(HoleCheck::ID, &context(), &CheckConfiguration::new())
            .expect("factory missing");
        assert_eq!(check.id(), HoleCheck::ID);
    }

    #[test]
    fn unknown_id_is_an_error() {
        let registry = CheckRegistry::with_builtin_checks();
        let result = registry.create_check("NoSuchCheck", &context(), &CheckConfiguration::new());
        assert!(matches!(result, Err(GeocheckError::UnknownCheckId(_))));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = CheckRegistry::with_builtin_checks();
        let result = registry.register(Box::new(DangleCheckFactory));
        assert_matches!(result, Err(GeocheckError::DuplicateCheckId(id)) if id == "DangleCheck");
    }

    #[test]
    fn incompatible_layers_are_rejected_at_construction() {
        use std::sync::Arc;

        let registry = CheckRegistry::with_builtin_checks();
        let mut pools = FeaturePools::new();
        pools.insert(
            "roads".to_string(),
            Arc::new(
                MemoryFeaturePool::builder("roads", GeometryType::Line, Crs::new("EPSG:3857"))
                    .build(),
            ),
        );

        let result = registry.create_check_for_layers(
            HoleCheck::ID,
            &context(),
            &CheckConfiguration::new(),
            &pools,
            &["roads".to_string()],
        );
        assert!(matches!(
            result,
            Err(GeocheckError::IncompatibleLayer { ref layer_id, .. }) if layer_id == "roads"
        ));

        let result = registry.create_check_for_layers(
            HoleCheck::ID,
            &context(),
            &CheckConfiguration::new(),
            &pools,
            &["parcels".to_string()],
        );
        assert!(matches!(result, Err(GeocheckError::UnknownLayer(ref id)) if id == "parcels"));

        assert!(registry
            .create_check_for_layers(
                DangleCheck::ID,
                &context(),
                &CheckConfiguration::new(),
                &pools,
                &["roads".to_string()],
            )
            .is_ok());
    }

    #[test]
    fn compatibility_follows_the_layer_geometry_type() {
        let registry = CheckRegistry::with_builtin_checks();
        let lines = MemoryFeaturePool::builder("roads", GeometryType::Line, Crs::new("EPSG:3857"))
            .build();
        assert_eq!(
            registry.compatible_check_ids(&lines),
            vec!["DangleCheck", "SelfIntersectionCheck"]
        );

        let points =
            MemoryFeaturePool::builder("pois", GeometryType::Point, Crs::new("EPSG:3857")).build();
        assert!(registry.compatible_check_ids(&points).is_empty());
    }
}
