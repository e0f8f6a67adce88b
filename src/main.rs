use std::{hint::black_box, ops::Deref, rc::Rc, time::Instant};

use clap::Parser;
use shrc::{Shrc, Weak};

/// Compare `Shrc` against `std::rc::Rc` on clone, deref and weak promotion.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Iterations per measurement
    #[arg(short = 'n', long, default_value_t = 10_000_000)]
    iterations: u64,
}

fn test_clone_shrc(n: u64) -> f64 {
    let shrc = Shrc::new(100);

    let start = Instant::now();
    for _ in 0..n {
        black_box(shrc.clone());
    }
    let end = Instant::now();
    (end - start).as_nanos() as f64 / n as f64
}

fn test_clone_rc(n: u64) -> f64 {
    let rc = Rc::new(100);

    let start = Instant::now();
    for _ in 0..n {
        black_box(rc.clone());
    }
    let end = Instant::now();
    (end - start).as_nanos() as f64 / n as f64
}

fn test_deref_shrc(n: u64) -> f64 {
    let shrc = Shrc::new(100);

    let start = Instant::now();
    for _ in 0..n {
        black_box(shrc.deref());
    }
    let end = Instant::now();
    (end - start).as_nanos() as f64 / n as f64
}

fn test_deref_rc(n: u64) -> f64 {
    let rc = Rc::new(100);

    let start = Instant::now();
    for _ in 0..n {
        black_box(rc.deref());
    }
    let end = Instant::now();
    (end - start).as_nanos() as f64 / n as f64
}

fn test_upgrade_shrc(n: u64) -> f64 {
    let shrc = Shrc::new(100);
    let weak = Shrc::downgrade(&shrc);

    let start = Instant::now();
    for _ in 0..n {
        black_box(Weak::upgrade(&weak));
    }
    let end = Instant::now();
    (end - start).as_nanos() as f64 / n as f64
}

fn test_upgrade_rc(n: u64) -> f64 {
    let rc = Rc::new(100);
    let weak = Rc::downgrade(&rc);

    let start = Instant::now();
    for _ in 0..n {
        black_box(weak.upgrade());
    }
    let end = Instant::now();
    (end - start).as_nanos() as f64 / n as f64
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let n = args.iterations.max(1);
    log::info!("running each measurement {} times", n);

    println!("Clone test Shrc ({}x): {}ns avg", n, test_clone_shrc(n));
    println!("Clone test Rc ({}x): {}ns avg", n, test_clone_rc(n));

    println!("Deref test Shrc ({}x): {}ns avg", n, test_deref_shrc(n));
    println!("Deref test Rc ({}x): {}ns avg", n, test_deref_rc(n));

    println!("Upgrade test Shrc ({}x): {}ns avg", n, test_upgrade_shrc(n));
    println!("Upgrade test Rc ({}x): {}ns avg", n, test_upgrade_rc(n));
}
