use distiller::distiller_tree::{MatchingConfig, NodeData, SimilarityMeasure, diff_trees};
use distiller::{ChangeDistiller, EntityType, StatementTree, StructureKind, StructureNode};
use divan::{Bencher, black_box};

fn main() {
    divan::main();
}

/// A method body with `blocks` if-statements of `per_block` calls each.
/// `revision` perturbs every fifth call and appends one statement per block.
fn body(blocks: usize, per_block: usize, revision: usize) -> StatementTree {
    let mut tree = StatementTree::new(NodeData::new(EntityType::Method, "void process()"));
    let root = tree.root;
    for b in 0..blocks {
        let guard = tree.add_child(
            root,
            NodeData::new(EntityType::IfStatement, format!("flags[{b}]")),
        );
        for s in 0..per_block {
            let value = if revision > 0 && s % 5 == 0 {
                format!("handler{b}.step{s}(context, {revision});")
            } else {
                format!("handler{b}.step{s}(context);")
            };
            tree.add_child(guard, NodeData::new(EntityType::MethodInvocation, value));
        }
        if revision > 0 {
            tree.add_child(
                guard,
                NodeData::new(EntityType::ReturnStatement, format!("return {b};")),
            );
        }
    }
    tree
}

fn file(methods: usize, revision: usize) -> StructureNode {
    let mut class = StructureNode::new(StructureKind::Class, "Pipeline").with_qualifier("bench");
    for m in 0..methods {
        let body = body(4, 8, revision * (m % 2));
        class.add_child(
            StructureNode::new(StructureKind::Method, format!("process{m}()"))
                .with_qualifier("bench.Pipeline")
                .with_content(body.to_string())
                .with_body(body),
        );
    }
    StructureNode::new(StructureKind::CompilationUnit, "Pipeline.java").with_child(class)
}

#[divan::bench(args = [4, 16, 64])]
fn diff_body_ngrams(bencher: Bencher, blocks: usize) {
    let left = body(blocks, 8, 0);
    let right = body(blocks, 8, 1);
    let config = MatchingConfig::default();
    bencher.bench_local(|| {
        let ops = diff_trees(black_box(&left), black_box(&right), &config);
        black_box(ops);
    });
}

#[divan::bench(args = [4, 16, 64])]
fn diff_body_levenshtein(bencher: Bencher, blocks: usize) {
    let left = body(blocks, 8, 0);
    let right = body(blocks, 8, 1);
    let config = MatchingConfig {
        leaf_similarity: SimilarityMeasure::Levenshtein,
        ..MatchingConfig::default()
    };
    bencher.bench_local(|| {
        let ops = diff_trees(black_box(&left), black_box(&right), &config);
        black_box(ops);
    });
}

#[divan::bench]
fn distill_file(bencher: Bencher) {
    let left = file(12, 0);
    let right = file(12, 1);
    let distiller = ChangeDistiller::default();
    bencher.bench_local(|| {
        let distillation = distiller.distill(black_box(&left), black_box(&right)).unwrap();
        black_box(distillation.operation_count());
    });
}

#[divan::bench]
fn distill_batch(bencher: Bencher) {
    let pairs: Vec<(StructureNode, StructureNode)> =
        (0..32).map(|_| (file(12, 0), file(12, 1))).collect();
    let distiller = ChangeDistiller::default();
    bencher.bench_local(|| {
        let results = distiller.distill_all(black_box(&pairs));
        black_box(results.len());
    });
}
