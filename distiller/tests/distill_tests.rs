//! End-to-end tests: structure alignment plus statement-level edit scripts.

use distiller::distiller_tree::{EditOp, NodeData, apply_edit_script};
use distiller::{
    ChangeDistiller, DiffType, EntityType, SourceRange, StatementTree, StructureKind,
    StructureNode,
};
use facet_testhelpers::test;

/// Tiny builder for statement trees: `(label, value, children)`.
struct Stmt(EntityType, &'static str, Vec<Stmt>);

fn leaf(label: EntityType, value: &'static str) -> Stmt {
    Stmt(label, value, Vec::new())
}

fn tree(root: Stmt) -> StatementTree {
    let Stmt(label, value, children) = root;
    let mut tree = StatementTree::new(NodeData::new(label, value));
    let root_id = tree.root;
    let mut offset = 0;
    for child in children {
        attach(&mut tree, root_id, child, &mut offset);
    }
    tree
}

fn attach(
    tree: &mut StatementTree,
    parent: distiller::distiller_tree::indextree::NodeId,
    node: Stmt,
    offset: &mut usize,
) {
    let Stmt(label, value, children) = node;
    let range = SourceRange::new(*offset, *offset + value.len());
    *offset += value.len() + 1;
    let id = tree.add_child(parent, NodeData::new(label, value).with_payload(range));
    for child in children {
        attach(tree, id, child, offset);
    }
}

fn method(name: &'static str, body: Stmt) -> StructureNode {
    let body = tree(body);
    StructureNode::new(StructureKind::Method, name)
        .with_qualifier("shop.Inventory")
        .with_content(body.to_string())
        .with_body(body)
}

fn restock_v1() -> Stmt {
    Stmt(
        EntityType::Method,
        "void restock(Item item, int amount)",
        vec![
            Stmt(
                EntityType::IfStatement,
                "amount <= 0",
                vec![Stmt(
                    EntityType::ThenStatement,
                    "",
                    vec![
                        leaf(EntityType::MethodInvocation, "log.warn(\"ignoring restock\");"),
                        leaf(EntityType::ReturnStatement, "return;"),
                    ],
                )],
            ),
            leaf(
                EntityType::VariableDeclarationStatement,
                "int current = stock.get(item);",
            ),
            leaf(EntityType::MethodInvocation, "stock.put(item, current + amount);"),
        ],
    )
}

fn restock_v2() -> Stmt {
    Stmt(
        EntityType::Method,
        "void restock(Item item, int amount)",
        vec![
            Stmt(
                EntityType::IfStatement,
                "amount <= 0",
                vec![Stmt(
                    EntityType::ThenStatement,
                    "",
                    vec![
                        leaf(EntityType::MethodInvocation, "log.warn(\"ignoring restock\");"),
                        leaf(
                            EntityType::ThrowStatement,
                            "throw new IllegalArgumentException(\"amount\");",
                        ),
                    ],
                )],
            ),
            leaf(
                EntityType::VariableDeclarationStatement,
                "int current = stock.getOrDefault(item, 0);",
            ),
            leaf(EntityType::MethodInvocation, "stock.put(item, current + amount);"),
            leaf(EntityType::MethodInvocation, "listeners.restocked(item);"),
        ],
    )
}

fn count_body() -> Stmt {
    Stmt(
        EntityType::Method,
        "int count(Item item)",
        vec![leaf(EntityType::ReturnStatement, "return stock.get(item);")],
    )
}

fn inventory(restock: Stmt, extra_field: bool, with_count: bool) -> StructureNode {
    let mut class = StructureNode::new(StructureKind::Class, "Inventory")
        .with_qualifier("shop")
        .with_content("public class Inventory")
        .with_child(
            StructureNode::new(StructureKind::Field, "stock")
                .with_qualifier("shop.Inventory")
                .with_content("private final Map<Item, Integer> stock;"),
        );
    if extra_field {
        class.add_child(
            StructureNode::new(StructureKind::Field, "listeners")
                .with_qualifier("shop.Inventory")
                .with_content("private final Listeners listeners;"),
        );
    }
    class.add_child(method("restock(Item,int)", restock));
    if with_count {
        class.add_child(method("count(Item)", count_body()));
    }
    StructureNode::new(StructureKind::CompilationUnit, "Inventory.java").with_child(class)
}

#[test]
fn test_identical_versions() {
    let left = inventory(restock_v1(), false, true);
    let right = inventory(restock_v1(), false, true);

    let distillation = ChangeDistiller::default().distill(&left, &right).unwrap();
    assert!(distillation.is_empty());
    assert!(
        distillation
            .structure
            .iter()
            .all(|node| node.diff_type() == DiffType::NoChange)
    );
}

#[test]
fn test_realistic_revision() {
    let left = inventory(restock_v1(), false, true);
    let right = inventory(restock_v2(), true, false);

    let distillation = ChangeDistiller::default().distill(&left, &right).unwrap();

    let changes: Vec<_> = distillation.structure.changes().collect();
    let summary: Vec<(DiffType, &str)> = changes
        .iter()
        .map(|node| (node.diff_type(), node.node().name()))
        .collect();
    assert_eq!(
        summary,
        [
            (DiffType::Addition, "listeners"),
            (DiffType::Change, "restock(Item,int)"),
            (DiffType::Deletion, "count(Item)"),
        ]
    );
    assert!(changes[0].is_field_diff_node());
    assert!(changes[2].is_method_or_constructor_diff_node());

    // Deleted and added declarations get no statement-level diff.
    assert_eq!(distillation.body_changes.len(), 1);
    let restock = &distillation.body_changes[0];
    assert_eq!(restock.right.name(), "restock(Item,int)");

    let updates: Vec<(&str, &str)> = restock
        .ops
        .iter()
        .filter_map(|op| match op {
            EditOp::Update {
                old_value,
                new_value,
                ..
            } => Some((old_value.as_str(), new_value.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(
        updates,
        [(
            "int current = stock.get(item);",
            "int current = stock.getOrDefault(item, 0);"
        )]
    );

    let inserted: Vec<EntityType> = restock
        .ops
        .iter()
        .filter_map(|op| match op {
            EditOp::Insert { data, .. } => Some(data.label),
            _ => None,
        })
        .collect();
    // Breadth-first: the new trailing call comes before the deeper throw.
    assert_eq!(
        inserted,
        [EntityType::MethodInvocation, EntityType::ThrowStatement]
    );

    let deleted = restock
        .ops
        .iter()
        .filter(|op| matches!(op, EditOp::Delete { .. }))
        .count();
    assert_eq!(deleted, 1);
}

#[test]
fn test_body_scripts_replay() {
    let left = inventory(restock_v1(), false, true);
    let right = inventory(restock_v2(), true, false);
    let distillation = ChangeDistiller::default().distill(&left, &right).unwrap();

    for change in &distillation.body_changes {
        let (Some(before), Some(after)) = (change.left.body(), change.right.body()) else {
            panic!("both sides of {} have bodies", change.right);
        };
        let mut replay = before.clone();
        apply_edit_script(&mut replay, &change.ops).unwrap();
        assert!(replay.is_isomorphic(after), "got\n{replay}expected\n{after}");
    }
}

#[test]
fn test_payloads_pass_through() {
    let left = inventory(restock_v1(), false, true);
    let right = inventory(restock_v2(), true, false);
    let distillation = ChangeDistiller::default().distill(&left, &right).unwrap();

    let inserted_ranges: Vec<Option<SourceRange>> = distillation.body_changes[0]
        .ops
        .iter()
        .filter_map(|op| match op {
            EditOp::Insert { data, .. } => Some(data.payload),
            _ => None,
        })
        .collect();
    assert!(inserted_ranges.iter().all(Option::is_some));
}

#[test]
fn test_moved_statement() {
    let before = Stmt(
        EntityType::Method,
        "void drain()",
        vec![
            leaf(EntityType::MethodInvocation, "lock.lock();"),
            Stmt(
                EntityType::WhileStatement,
                "!queue.isEmpty()",
                vec![leaf(EntityType::MethodInvocation, "queue.poll().run();")],
            ),
            leaf(EntityType::MethodInvocation, "metrics.drained();"),
        ],
    );
    let after = Stmt(
        EntityType::Method,
        "void drain()",
        vec![
            leaf(EntityType::MethodInvocation, "lock.lock();"),
            Stmt(
                EntityType::WhileStatement,
                "!queue.isEmpty()",
                vec![
                    leaf(EntityType::MethodInvocation, "queue.poll().run();"),
                    leaf(EntityType::MethodInvocation, "metrics.drained();"),
                ],
            ),
        ],
    );

    let left = method("drain()", before);
    let right = method("drain()", after);
    let distillation = ChangeDistiller::default().distill(&left, &right).unwrap();

    let ops = &distillation.body_changes[0].ops;
    assert_eq!(ops.len(), 1, "got {ops:?}");
    assert!(matches!(ops[0], EditOp::Move { position: 1, .. }));
}

#[test]
fn test_batch() {
    let pairs: Vec<(StructureNode, StructureNode)> = (0..8)
        .map(|i| {
            let left = inventory(restock_v1(), false, true);
            let right = if i % 2 == 0 {
                inventory(restock_v1(), false, true)
            } else {
                inventory(restock_v2(), true, false)
            };
            (left, right)
        })
        .collect();

    let results = ChangeDistiller::default().distill_all(&pairs);
    for (i, result) in results.iter().enumerate() {
        let distillation = result.as_ref().unwrap();
        assert_eq!(distillation.is_empty(), i % 2 == 0);
    }
}
