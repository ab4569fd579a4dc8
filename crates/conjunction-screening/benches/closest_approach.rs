use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};

use conjunction_screening::{find_closest_approach, SearchParams};
use orbital_mechanics::{Result, StateProvider, StateVector};

/// Analytic circular orbit in the equatorial plane; cheap enough that the
/// benchmark measures the search loop rather than propagation.
struct CircularOrbit {
    radius_km: f64,
    period_s: f64,
    phase_rad: f64,
}

impl StateProvider for CircularOrbit {
    fn state_at(&self, time: chrono::DateTime<Utc>) -> Result<StateVector> {
        let t = time.timestamp() as f64;
        let omega = 2.0 * std::f64::consts::PI / self.period_s;
        let angle = omega * t + self.phase_rad;

        Ok(StateVector {
            position_km: [
                self.radius_km * angle.cos(),
                self.radius_km * angle.sin(),
                0.0,
            ],
            velocity_km_s: [
                -self.radius_km * omega * angle.sin(),
                self.radius_km * omega * angle.cos(),
                0.0,
            ],
            epoch: time,
        })
    }
}

fn bench_two_day_window(c: &mut Criterion) {
    let a = CircularOrbit {
        radius_km: 6790.0,
        period_s: 5580.0,
        phase_rad: 0.0,
    };
    let b = CircularOrbit {
        radius_km: 6790.0,
        period_s: 5580.0,
        phase_rad: 0.002,
    };

    let params = SearchParams {
        start: Utc.with_ymd_and_hms(2024, 3, 25, 0, 0, 0).unwrap(),
        duration: Duration::seconds(172_800),
        coarse_step: Duration::seconds(3_600),
        fine_step: Duration::seconds(60),
        threshold_km: 25.0,
        pair_deadline: None,
    };

    c.bench_function("closest_approach_two_day_window", |bencher| {
        bencher.iter(|| find_closest_approach(&a, &b, &params).unwrap())
    });
}

criterion_group!(benches, bench_two_day_window);
criterion_main!(benches);
