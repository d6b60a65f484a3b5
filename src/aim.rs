//! Aim source resolution.
//!
//! Turns whatever pose sources the host has this frame into one usable world
//! direction. The raycast hit is treated as a pull target: the returned
//! direction points from the reference actor to the first hit beyond it, so a
//! camera or controller that is offset from the actor still aims the actor.
//!
//! Resolution is a pure function of the provider's state. Nothing is cached
//! between calls.

pub mod movement;

use crate::config::DirectionSource;
use crate::logging::LogLimiter;
use crate::spatial::{
    project_on_horizontal, GripSelection, Pose, RaySource, RaySourceKind, SpatialSourceProvider,
    DIRECTION_EPSILON,
};
use glam::Vec3;
use std::sync::Arc;
use std::time::Duration;

/// A hit must lie this far beyond the actor's projected distance along the ray to count.
pub const HIT_EXCLUSION_MARGIN: f32 = 0.01;

/// Distance used when a request carries a non-positive or non-finite maximum.
const MIN_RAY_DISTANCE: f32 = 1.0;

/// One collision returned by a cast-all query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Scene raycasts. Implementations return every hit along the ray, in any order.
pub trait RaycastService {
    fn cast_all(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Vec<RaycastHit>;
}

/// Parameters of one resolution. Built fresh from configuration every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimRequest {
    pub use_controller_source: bool,
    pub hand_preference: GripSelection,
    /// Flatten the final direction onto the horizontal plane.
    pub project_to_horizontal_plane: bool,
    pub max_distance: f32,
    /// Flatten the ray itself before casting.
    pub use_horizon_ray: bool,
}

impl AimRequest {
    pub fn new(source: DirectionSource, hand_preference: GripSelection, max_distance: f32) -> Self {
        let max_distance = if max_distance.is_finite() && max_distance > 0.0 {
            max_distance
        } else {
            MIN_RAY_DISTANCE
        };

        Self {
            use_controller_source: source.uses_controller(),
            hand_preference,
            project_to_horizontal_plane: false,
            max_distance,
            use_horizon_ray: false,
        }
    }

    pub fn projected(mut self, project: bool) -> Self {
        self.project_to_horizontal_plane = project;
        self
    }

    pub fn horizon_ray(mut self, horizon: bool) -> Self {
        self.use_horizon_ray = horizon;
        self
    }
}

/// Outcome of one resolution.
///
/// `direction` is always unit length. Everything else is diagnostic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimResolution {
    pub direction: Vec3,
    /// `None` when no pose source was usable and the fallback forward was returned.
    pub source: Option<RaySource>,
    /// The normalized (and possibly horizon-flattened) ray direction that was cast.
    pub ray_direction: Option<Vec3>,
    pub target_point: Option<Vec3>,
    pub hit: Option<RaycastHit>,
}

impl AimResolution {
    fn fallback(direction: Vec3) -> Self {
        Self {
            direction,
            source: None,
            ray_direction: None,
            target_point: None,
            hit: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source.is_none()
    }

    pub fn source_kind(&self) -> Option<RaySourceKind> {
        self.source.map(|source| source.kind)
    }
}

/// Resolves aim requests against a host's poses and scene.
#[derive(Debug, Clone)]
pub struct AimSourceResolver {
    limiter: Arc<LogLimiter>,
    log_interval: Duration,
    trace: bool,
}

impl Default for AimSourceResolver {
    fn default() -> Self {
        Self::new(Arc::new(LogLimiter::new()), Duration::from_millis(500), false)
    }
}

impl AimSourceResolver {
    /// `trace` enables rate-limited debug lines describing each resolution.
    pub fn new(limiter: Arc<LogLimiter>, log_interval: Duration, trace: bool) -> Self {
        Self {
            limiter,
            log_interval,
            trace,
        }
    }

    pub fn resolve<P>(&self, provider: &P, request: &AimRequest) -> AimResolution
    where
        P: SpatialSourceProvider + RaycastService + ?Sized,
    {
        let resolution = match select_source(provider, request) {
            Some(source) => resolve_from_source(provider, request, source),
            None => AimResolution::fallback(fallback_forward(provider)),
        };

        if self.trace && self.limiter.allow("aim.resolve", self.log_interval) {
            match resolution.source {
                Some(source) => log::debug!(
                    "aim: source={} dir={:?} hit={}",
                    source.kind,
                    resolution.direction,
                    resolution.hit.is_some()
                ),
                None => log::debug!("aim: no source, fallback dir={:?}", resolution.direction),
            }
        }

        resolution
    }
}

/// Pick the first usable pose source for `request`.
pub fn select_source<P>(provider: &P, request: &AimRequest) -> Option<RaySource>
where
    P: SpatialSourceProvider + ?Sized,
{
    if !request.use_controller_source {
        return provider
            .head_pose()
            .map(|pose| RaySource::from_pose(pose, RaySourceKind::HeadHmd))
            .filter(is_usable);
    }

    let hand = request
        .hand_preference
        .hand(provider.dominant_hand_is_left());

    let from = |pose: Option<Pose>, kind: RaySourceKind| {
        pose.map(|pose| RaySource::from_pose(pose, kind))
            .filter(is_usable)
    };

    from(provider.controller_ray(hand), RaySourceKind::ControllerRay(hand))
        .or_else(|| {
            let other = hand.other();
            from(provider.controller_ray(other), RaySourceKind::ControllerRay(other))
        })
        .or_else(|| from(provider.hand_pose(hand), RaySourceKind::TrackedHand(hand)))
        .or_else(|| from(provider.secondary_hand_pose(), RaySourceKind::SecondaryHand))
        .or_else(|| from(provider.head_transform(), RaySourceKind::HeadTransform))
}

fn is_usable(source: &RaySource) -> bool {
    source.origin.is_finite()
        && source.forward.is_finite()
        && source.forward.length_squared() >= DIRECTION_EPSILON
}

fn resolve_from_source<P>(provider: &P, request: &AimRequest, source: RaySource) -> AimResolution
where
    P: SpatialSourceProvider + RaycastService + ?Sized,
{
    let mut ray_direction = source.forward.normalize();
    if request.use_horizon_ray {
        let flattened = project_on_horizontal(ray_direction);
        if flattened.length_squared() > DIRECTION_EPSILON {
            ray_direction = flattened.normalize();
        }
    }

    let reference = provider
        .reference_actor_position()
        .filter(|position| position.is_finite())
        .unwrap_or(source.origin);
    let actor_distance = (reference - source.origin).dot(ray_direction);

    let mut hits = provider.cast_all(source.origin, ray_direction, request.max_distance);
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    let hit = hits
        .into_iter()
        .find(|hit| {
            hit.point.is_finite() && hit.distance > actor_distance + HIT_EXCLUSION_MARGIN
        });

    let target_point = match hit {
        Some(hit) => hit.point,
        None => source.origin + ray_direction * request.max_distance,
    };

    let mut direction = target_point - reference;
    if request.project_to_horizontal_plane {
        direction = project_on_horizontal(direction);
    }
    let direction = if direction.length_squared() < DIRECTION_EPSILON {
        ray_direction
    } else {
        direction.normalize()
    };

    AimResolution {
        direction,
        source: Some(source),
        ray_direction: Some(ray_direction),
        target_point: Some(target_point),
        hit,
    }
}

/// Direction returned when no pose source exists: the camera-aligned forward.
///
/// Tracked hand and head transforms were already tried as sources, so the
/// ladder bottoms out here in both modes.
fn fallback_forward<P>(provider: &P) -> Vec3
where
    P: SpatialSourceProvider + ?Sized,
{
    provider.aligned_forward()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Hand;
    use glam::Quat;

    #[derive(Default)]
    struct Scene {
        head: Option<Pose>,
        rays: [Option<Pose>; 2],
        hands: [Option<Pose>; 2],
        head_transform: Option<Pose>,
        camera: Option<Pose>,
        actor: Option<Vec3>,
        hits: Vec<RaycastHit>,
    }

    fn slot(hand: Hand) -> usize {
        match hand {
            Hand::Left => 0,
            Hand::Right => 1,
        }
    }

    impl SpatialSourceProvider for Scene {
        fn head_pose(&self) -> Option<Pose> {
            self.head
        }
        fn controller_ray(&self, hand: Hand) -> Option<Pose> {
            self.rays[slot(hand)]
        }
        fn hand_pose(&self, hand: Hand) -> Option<Pose> {
            self.hands[slot(hand)]
        }
        fn head_transform(&self) -> Option<Pose> {
            self.head_transform
        }
        fn camera_pose(&self) -> Option<Pose> {
            self.camera
        }
        fn dominant_hand_is_left(&self) -> bool {
            false
        }
        fn reference_actor_position(&self) -> Option<Vec3> {
            self.actor
        }
    }

    impl RaycastService for Scene {
        fn cast_all(&self, _origin: Vec3, _direction: Vec3, max_distance: f32) -> Vec<RaycastHit> {
            self.hits
                .iter()
                .copied()
                .filter(|hit| hit.distance <= max_distance)
                .collect()
        }
    }

    fn hit_at(distance: f32, point: Vec3) -> RaycastHit {
        RaycastHit {
            distance,
            point,
            normal: -Vec3::Z,
        }
    }

    fn controller(max: f32) -> AimRequest {
        AimRequest::new(DirectionSource::ControllerRaycast, GripSelection::Auto, max)
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn no_hits_targets_the_ray_endpoint() {
        let origin = Vec3::new(0.0, 1.5, 0.0);
        let actor = Vec3::new(2.0, 0.0, 3.0);
        let scene = Scene {
            head: Some(Pose::looking(origin, Vec3::Z)),
            actor: Some(actor),
            ..Default::default()
        };
        let request = AimRequest::new(DirectionSource::HeadRaycast, GripSelection::Auto, 40.0);

        let resolution = AimSourceResolver::default().resolve(&scene, &request);

        let target = origin + Vec3::Z * 40.0;
        assert_close(resolution.target_point.unwrap(), target);
        assert_close(resolution.direction, (target - actor).normalize());
        assert!(resolution.hit.is_none());
    }

    #[test]
    fn hits_at_or_behind_the_actor_are_skipped() {
        let scene = Scene {
            head: Some(Pose::looking(Vec3::ZERO, Vec3::Z)),
            actor: Some(Vec3::new(0.0, 0.0, 5.0)),
            hits: vec![
                hit_at(12.0, Vec3::new(1.0, 0.0, 12.0)),
                hit_at(5.005, Vec3::new(0.0, 0.0, 5.005)),
                hit_at(3.0, Vec3::new(0.0, 0.0, 3.0)),
            ],
            ..Default::default()
        };
        let request = AimRequest::new(DirectionSource::HeadRaycast, GripSelection::Auto, 40.0);

        let resolution = AimSourceResolver::default().resolve(&scene, &request);

        assert_eq!(resolution.hit.unwrap().distance, 12.0);
        assert_close(
            resolution.direction,
            Vec3::new(1.0, 0.0, 7.0).normalize(),
        );
    }

    #[test]
    fn hits_with_non_finite_points_are_ignored() {
        let scene = Scene {
            head: Some(Pose::looking(Vec3::ZERO, Vec3::Z)),
            actor: Some(Vec3::ZERO),
            hits: vec![
                hit_at(6.0, Vec3::new(f32::NAN, 0.0, 6.0)),
                hit_at(9.0, Vec3::new(0.0, 0.0, f32::INFINITY)),
                hit_at(15.0, Vec3::new(3.0, 0.0, 15.0)),
            ],
            ..Default::default()
        };
        let request = AimRequest::new(DirectionSource::HeadRaycast, GripSelection::Auto, 40.0);

        let resolution = AimSourceResolver::default().resolve(&scene, &request);

        assert_eq!(resolution.hit.unwrap().distance, 15.0);
        assert!(resolution.direction.is_finite());
        assert_close(resolution.direction, Vec3::new(3.0, 0.0, 15.0).normalize());
    }

    #[test]
    fn controller_mode_prefers_selected_ray_then_other_hand() {
        let mut scene = Scene {
            rays: [
                Some(Pose::looking(Vec3::ZERO, Vec3::X)),
                Some(Pose::looking(Vec3::ZERO, -Vec3::X)),
            ],
            ..Default::default()
        };
        // Auto with a right-dominant host picks the left hand.
        let kind = select_source(&scene, &controller(10.0)).unwrap().kind;
        assert_eq!(kind, RaySourceKind::ControllerRay(Hand::Left));

        scene.rays[0] = None;
        let kind = select_source(&scene, &controller(10.0)).unwrap().kind;
        assert_eq!(kind, RaySourceKind::ControllerRay(Hand::Right));
    }

    #[test]
    fn controller_mode_falls_back_to_tracked_hand_then_head_transform() {
        let mut scene = Scene {
            hands: [Some(Pose::looking(Vec3::ZERO, Vec3::X)), None],
            head_transform: Some(Pose::looking(Vec3::Y, Vec3::Z)),
            ..Default::default()
        };
        let kind = select_source(&scene, &controller(10.0)).unwrap().kind;
        assert_eq!(kind, RaySourceKind::TrackedHand(Hand::Left));

        scene.hands[0] = None;
        let kind = select_source(&scene, &controller(10.0)).unwrap().kind;
        assert_eq!(kind, RaySourceKind::HeadTransform);
    }

    #[test]
    fn head_mode_ignores_controllers() {
        let scene = Scene {
            rays: [Some(Pose::looking(Vec3::ZERO, Vec3::X)), None],
            camera: Some(Pose::looking(Vec3::ZERO, -Vec3::Z)),
            ..Default::default()
        };
        let request = AimRequest::new(DirectionSource::HeadRaycast, GripSelection::Left, 10.0);
        let resolution = AimSourceResolver::default().resolve(&scene, &request);

        assert!(resolution.is_fallback());
        assert_eq!(resolution.source_kind(), None);
        assert_close(resolution.direction, -Vec3::Z);
    }

    #[test]
    fn horizon_ray_keeps_pitch_when_looking_straight_down() {
        let down = Pose::new(Vec3::new(0.0, 2.0, 0.0), Quat::from_rotation_x(90f32.to_radians()));
        let scene = Scene {
            head: Some(down),
            ..Default::default()
        };
        let request = AimRequest::new(DirectionSource::HeadRaycast, GripSelection::Auto, 5.0)
            .horizon_ray(true);

        let resolution = AimSourceResolver::default().resolve(&scene, &request);
        assert_eq!(resolution.source_kind(), Some(RaySourceKind::HeadHmd));
        assert_close(resolution.ray_direction.unwrap(), down.forward());
    }

    #[test]
    fn projected_direction_has_no_vertical_component() {
        let scene = Scene {
            head: Some(Pose::looking(Vec3::new(0.0, 1.7, 0.0), Vec3::new(0.3, -0.4, 1.0))),
            actor: Some(Vec3::new(0.5, 0.0, 1.0)),
            ..Default::default()
        };
        let request = AimRequest::new(DirectionSource::HeadRaycast, GripSelection::Auto, 30.0)
            .projected(true);

        let direction = AimSourceResolver::default().resolve(&scene, &request).direction;
        assert!(direction.y.abs() < 1e-6);
        assert!((direction.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_target_falls_back_to_ray_direction() {
        // The only hit sits exactly where the actor stands, straight below the ray.
        let scene = Scene {
            head: Some(Pose::looking(Vec3::ZERO, Vec3::Z)),
            actor: Some(Vec3::new(0.0, -3.0, 8.0)),
            hits: vec![hit_at(8.0, Vec3::new(0.0, 0.0, 8.0))],
            ..Default::default()
        };
        let request = AimRequest::new(DirectionSource::HeadRaycast, GripSelection::Auto, 8.0)
            .projected(true);

        let resolution = AimSourceResolver::default().resolve(&scene, &request);
        assert!(resolution.hit.is_none());
        assert_close(resolution.direction, Vec3::Z);
    }

    #[test]
    fn invalid_max_distance_is_replaced() {
        let request = AimRequest::new(DirectionSource::HeadRaycast, GripSelection::Auto, -3.0);
        assert_eq!(request.max_distance, MIN_RAY_DISTANCE);
        let request = AimRequest::new(DirectionSource::HeadRaycast, GripSelection::Auto, f32::NAN);
        assert_eq!(request.max_distance, MIN_RAY_DISTANCE);
    }
}
