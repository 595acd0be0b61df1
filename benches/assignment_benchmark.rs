use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use eudorama::models::{ClientRecord, Credential, Subscriptions};
use eudorama::services::assignment::{assign, assigned_clients};
use eudorama::services::rotation::current_trial_password;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;

/// A reseller-sized snapshot: 600 clients over four services.
fn fixture() -> (Vec<Credential>, Vec<ClientRecord>) {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let services = ["Viki Pass", "Kocowa+", "IQIYI", "WeTV"];

    let credentials = (0..80)
        .map(|i| {
            Credential::new(
                services[i % services.len()],
                &format!("login{}@mail", i),
                "pw",
                start + Duration::hours(i as i64),
            )
        })
        .collect();

    let clients = (0..600)
        .map(|i| {
            let subs = Subscriptions::from_list(&services[..1 + i % services.len()]);
            ClientRecord::new(&format!("119{:08}", i), subs, start)
        })
        .collect();

    (credentials, clients)
}

fn benchmark_assignment(c: &mut Criterion) {
    let (credentials, clients) = fixture();
    let now = Utc.with_ymd_and_hms(2024, 6, 20, 12, 0, 0).unwrap();
    let last = clients[clients.len() - 1].phone_number.clone();
    let mut rng = StdRng::seed_from_u64(1);

    let mut group = c.benchmark_group("assignment");

    group.bench_function("forward_last_in_roster", |b| {
        b.iter(|| {
            assign(
                black_box(&last),
                "Viki Pass",
                &credentials,
                &clients,
                now,
                &mut rng,
            )
        })
    });

    group.bench_function("reverse_first_credential", |b| {
        b.iter(|| assigned_clients(black_box(&credentials[0]), &credentials, &clients))
    });

    group.bench_function("trial_password", |b| {
        b.iter(|| current_trial_password(black_box(now)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_assignment);
criterion_main!(benches);
