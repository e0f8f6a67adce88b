use std::{ops::Deref, rc::Rc};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shrc::{Shrc, Weak};

//cargo bench --bench benchmark

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("Clone Shrc", |b| b.iter(clone_shrc));
    c.bench_function("Clone Rc", |b| b.iter(clone_rc));
    c.bench_function("Multiple clone Shrc", |b| b.iter(multi_clone_shrc));
    c.bench_function("Multiple clone Rc", |b| b.iter(multi_clone_rc));
    c.bench_function("Deref Shrc", |b| b.iter(deref_shrc));
    c.bench_function("Deref Rc", |b| b.iter(deref_rc));
    c.bench_function("Multiple deref Shrc", |b| b.iter(multi_deref_shrc));
    c.bench_function("Multiple deref Rc", |b| b.iter(multi_deref_rc));
    c.bench_function("Multiple upgrade Shrc", |b| b.iter(multi_upgrade_shrc));
    c.bench_function("Multiple upgrade Rc", |b| b.iter(multi_upgrade_rc));
    c.bench_function("Outlive Weak Shrc", |b| b.iter(outlive_weak_shrc));
    c.bench_function("Outlive Weak Rc", |b| b.iter(outlive_weak_rc));
}

fn clone_shrc() {
    let shrc = Shrc::new(100);
    let _ = black_box(Shrc::clone(&shrc));
}

fn clone_rc() {
    let rc = Rc::new(100);
    let _ = black_box(Rc::clone(&rc));
}

fn multi_clone_shrc() {
    let shrc = Shrc::new(100);
    for _ in 0..100 {
        let _ = black_box(shrc.clone());
    }
}

fn multi_clone_rc() {
    let rc = Rc::new(100);
    for _ in 0..100 {
        let _ = black_box(rc.clone());
    }
}

fn deref_shrc() {
    let shrc = Shrc::new(100);
    let _ = black_box(shrc.deref());
}

fn deref_rc() {
    let rc = Rc::new(100);
    let _ = black_box(rc.deref());
}

fn multi_deref_shrc() {
    let shrc = Shrc::new(100);
    for _ in 0..100 {
        let _ = black_box(shrc.deref());
    }
}

fn multi_deref_rc() {
    let rc = Rc::new(100);
    for _ in 0..100 {
        let _ = black_box(rc.deref());
    }
}

fn multi_upgrade_shrc() {
    let shrc = Shrc::new(100);
    let weak = Shrc::downgrade(&shrc);
    for _ in 0..100 {
        let _ = black_box(Weak::upgrade(&weak));
    }
}

fn multi_upgrade_rc() {
    let rc = Rc::new(100);
    let weak = Rc::downgrade(&rc);
    for _ in 0..100 {
        let _ = black_box(weak.upgrade());
    }
}

fn outlive_weak_shrc() {
    let shrc = Shrc::new(String::from("value"));
    let weak = Shrc::downgrade(&shrc);
    drop(shrc);
    let _ = black_box(Weak::expired(&weak));
}

fn outlive_weak_rc() {
    let rc = Rc::new(String::from("value"));
    let weak = Rc::downgrade(&rc);
    drop(rc);
    let _ = black_box(weak.strong_count() == 0);
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
