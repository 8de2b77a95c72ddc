use iai_callgrind::{black_box, library_benchmark, library_benchmark_group, main};
use linden::{
    codec::{to_rows, RowOptions},
    edge::{Edge, EdgeSet},
    tree::Forest,
    value::Key,
};

/// A complete tree with the given branching factor and depth, keyed by integers in
/// breadth-first order.
fn complete_tree((branching, depth): (usize, u32)) -> EdgeSet {
    let n: usize = (0..=depth).map(|d| branching.pow(d)).sum();
    let edges = (1..n).map(|i| Edge::new(Key::Int(((i - 1) / branching) as i64), Key::Int(i as i64)));
    EdgeSet::from_edges(edges).unwrap()
}

/// A single chain of `len` nodes.
fn chain(len: usize) -> EdgeSet {
    let edges = (1..len).map(|i| Edge::new(Key::Int(i as i64 - 1), Key::Int(i as i64)));
    EdgeSet::from_edges(edges).unwrap()
}

fn built_tree(shape: (usize, u32)) -> Forest {
    Forest::build(&complete_tree(shape)).unwrap()
}

#[library_benchmark]
#[bench::binary(args = [(2, 10)], setup = complete_tree)]
#[bench::wide(args = [(32, 2)], setup = complete_tree)]
fn bench_build(edges: EdgeSet) -> Forest {
    black_box(Forest::build(&edges).unwrap())
}

#[library_benchmark]
#[bench::chain(args = [2000], setup = chain)]
fn bench_build_chain(edges: EdgeSet) -> Forest {
    black_box(Forest::build(&edges).unwrap())
}

#[library_benchmark]
#[bench::binary(args = [(2, 10)], setup = built_tree)]
#[bench::wide(args = [(32, 2)], setup = built_tree)]
fn bench_flatten(forest: Forest) -> usize {
    black_box(to_rows(&forest, &RowOptions::default()).unwrap().len())
}

#[library_benchmark]
#[bench::binary(args = [(2, 10)], setup = built_tree)]
fn bench_nodes(forest: Forest) -> usize {
    black_box(to_rows(&forest, &RowOptions::default().nodes()).unwrap().len())
}

library_benchmark_group!(
    name = build_group;
    benchmarks = bench_build, bench_build_chain
);

library_benchmark_group!(
    name = flatten_group;
    benchmarks = bench_flatten, bench_nodes
);

main!(library_benchmark_groups = build_group, flatten_group);
