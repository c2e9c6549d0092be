use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use memsift::report::frame::Frame;
use memsift::report::stack::Stack;
use memsift::{Configuration, RuntimeVersion};

fn frame(function: &str, object: &str) -> Frame {
    Frame {
        function: Some(function.to_string()),
        object: Some(object.to_string()),
        ..Frame::default()
    }
}

fn bench_skip_policy(c: &mut Criterion) {
    let config = Configuration::new(
        "my_ext",
        "/usr/bin/ruby",
        RuntimeVersion::new("ruby", "3.1.2", "20"),
    );
    let mut group = c.benchmark_group("skip_policy");

    // Deep all-runtime stack: the policy walks every frame before
    // deciding the stack never entered the target.
    let runtime_only = Stack::new(
        (0..64)
            .map(|i| frame(&format!("vm_call{i}"), "/usr/bin/ruby"))
            .collect(),
    );
    group.throughput(Throughput::Elements(64));
    group.bench_function("runtime_only_64", |b| b.iter(|| runtime_only.skip(&config)));

    // Target frame near the bottom of the stack.
    let mut frames: Vec<Frame> = (0..63)
        .map(|i| frame(&format!("vm_call{i}"), "/usr/bin/ruby"))
        .collect();
    frames.push(frame("my_alloc", "/build/my_ext.so"));
    let deep_target = Stack::new(frames);
    group.throughput(Throughput::Elements(64));
    group.bench_function("deep_target_64", |b| b.iter(|| deep_target.skip(&config)));

    group.finish();
}

criterion_group!(benches, bench_skip_policy);
criterion_main!(benches);
