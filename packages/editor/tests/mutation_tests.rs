use serde_json::json;
use stagehand_editor::{
    locate, Document, EditOutcome, MovePlacement, NewElement, NewElementKind,
};
use std::path::Path;

const DOC_PATH: &str = "/project/scene.tsx";

fn open(source: &str) -> Document {
    Document::open(DOC_PATH, source.to_string()).unwrap()
}

fn index(doc: &Document, export: &str) -> Vec<stagehand_editor::ElementPositionNode> {
    locate(doc.ast(), Path::new(DOC_PATH), doc.positions(), export).unwrap()
}

fn flat_names(nodes: &[stagehand_editor::ElementPositionNode]) -> Vec<String> {
    let mut out = Vec::new();
    for node in nodes {
        out.push(node.name.clone());
        out.extend(flat_names(&node.children));
    }
    out
}

#[test]
fn test_add_host_element_to_fragment_root() {
    let mut doc = open("export default function Scene(){ return <><mesh/></> }");
    let new = NewElement {
        tag: "group".to_string(),
        kind: NewElementKind::Host,
        props: serde_json::Map::new(),
    };
    let (outcome, position) = doc
        .edit(|b| b.add_element("default", &new, None))
        .unwrap();
    assert!(matches!(outcome, EditOutcome::Committed { .. }));

    let nodes = index(&doc, "default");
    assert_eq!(flat_names(&nodes), ["mesh", "group"]);
    assert_eq!((nodes[1].line, nodes[1].column), position);
}

#[test]
fn test_add_into_self_closing_parent_converts_to_balanced() {
    let mut doc = open(
        "export default function Scene() {\n  return (\n    <group>\n      <mesh />\n    </group>\n  );\n}\n",
    );
    let mesh = index(&doc, "default")[0].children[0].clone();
    let new = NewElement {
        tag: "spotLight".to_string(),
        kind: NewElementKind::Host,
        props: serde_json::Map::new(),
    };
    doc.edit(|b| b.add_element("default", &new, Some((mesh.line, mesh.column))))
        .unwrap();

    assert!(doc.source().contains("<mesh>"));
    assert!(doc.source().contains("</mesh>"));
    let nodes = index(&doc, "default");
    assert_eq!(flat_names(&nodes), ["group", "mesh", "spotLight"]);
}

#[test]
fn test_add_renders_initial_props() {
    let mut doc = open("export default function Scene(){ return <><mesh/></> }");
    let mut props = serde_json::Map::new();
    props.insert("position".to_string(), json!([0, 1, 0]));
    props.insert("visible".to_string(), json!(true));
    let new = NewElement {
        tag: "group".to_string(),
        kind: NewElementKind::Host,
        props,
    };
    doc.edit(|b| b.add_element("default", &new, None)).unwrap();
    assert!(doc
        .source()
        .contains("<group position={[0, 1, 0]} visible={true} />"));
}

#[test]
fn test_add_custom_element_reuses_existing_import() {
    let mut doc = open(
        "import { Box as Box1 } from \"./box\";\nexport default function Scene() {\n  return (\n    <>\n      <Box1 />\n    </>\n  );\n}\n",
    );
    let new = NewElement {
        tag: "Box".to_string(),
        kind: NewElementKind::Custom {
            module: "./box".to_string(),
            export_name: "Box".to_string(),
        },
        props: serde_json::Map::new(),
    };
    doc.edit(|b| b.add_element("default", &new, None)).unwrap();

    assert_eq!(doc.source().matches("import").count(), 1);
    assert_eq!(doc.source().matches("<Box1 />").count(), 2);
}

#[test]
fn test_add_custom_element_breaks_name_collision_with_suffix() {
    let mut doc = open(
        "import Box from \"./box\";\nexport default function Scene() {\n  return (\n    <>\n      <Box />\n    </>\n  );\n}\n",
    );
    let new = NewElement {
        tag: "Box".to_string(),
        kind: NewElementKind::Custom {
            module: "./other".to_string(),
            export_name: "default".to_string(),
        },
        props: serde_json::Map::new(),
    };
    doc.edit(|b| b.add_element("default", &new, None)).unwrap();

    assert!(doc.source().contains("import Box1 from \"./other\";"));
    assert!(doc.source().contains("<Box1 />"));
}

#[test]
fn test_duplicate_inserts_clone_after_original() {
    let mut doc = open(
        "export default function Scene() {\n  return (\n    <>\n      <mesh scale={2} />\n      <group />\n    </>\n  );\n}\n",
    );
    let mesh = index(&doc, "default")[0].clone();
    let (_, position) = doc
        .edit(|b| b.duplicate(mesh.line, mesh.column))
        .unwrap();

    let nodes = index(&doc, "default");
    assert_eq!(flat_names(&nodes), ["mesh", "mesh", "group"]);
    assert_eq!((nodes[1].line, nodes[1].column), position);
    assert_eq!(doc.source().matches("<mesh scale={2} />").count(), 2);
}

#[test]
fn test_move_before_reorders_siblings() {
    let mut doc = open(
        "export default function Scene() {\n  return (\n    <group>\n      <mesh />\n      <spotLight />\n    </group>\n  );\n}\n",
    );
    let nodes = index(&doc, "default");
    let mesh = nodes[0].children[0].clone();
    let light = nodes[0].children[1].clone();
    doc.edit(|b| {
        b.move_element(
            (light.line, light.column),
            (mesh.line, mesh.column),
            MovePlacement::Before,
        )
    })
    .unwrap();

    let nodes = index(&doc, "default");
    assert_eq!(flat_names(&nodes), ["group", "spotLight", "mesh"]);
}

#[test]
fn test_move_make_child_converts_self_closing_destination() {
    let mut doc = open(
        "export default function Scene() {\n  return (\n    <group>\n      <mesh />\n      <spotLight />\n    </group>\n  );\n}\n",
    );
    let nodes = index(&doc, "default");
    let mesh = nodes[0].children[0].clone();
    let light = nodes[0].children[1].clone();
    doc.edit(|b| {
        b.move_element(
            (light.line, light.column),
            (mesh.line, mesh.column),
            MovePlacement::MakeChild,
        )
    })
    .unwrap();

    let nodes = index(&doc, "default");
    assert_eq!(nodes[0].name, "group");
    assert_eq!(nodes[0].children.len(), 1);
    assert_eq!(nodes[0].children[0].name, "mesh");
    assert_eq!(nodes[0].children[0].children[0].name, "spotLight");
}

#[test]
fn test_move_into_own_subtree_is_rejected() {
    let mut doc = open(
        "export default function Scene() {\n  return (\n    <group>\n      <mesh />\n    </group>\n  );\n}\n",
    );
    let nodes = index(&doc, "default");
    let group = nodes[0].clone();
    let mesh = nodes[0].children[0].clone();
    let result = doc.edit(|b| {
        b.move_element(
            (group.line, group.column),
            (mesh.line, mesh.column),
            MovePlacement::Before,
        )
    });
    assert!(result.is_err());
}

#[test]
fn test_soft_delete_hides_and_restore_round_trips() {
    let source = "export default function Scene() {\n  return (\n    <group>\n      <mesh scale={2} />\n    </group>\n  );\n}\n";
    let mut doc = open(source);
    let mesh = index(&doc, "default")[0].children[0].clone();

    doc.edit(|b| b.delete_element(mesh.line, mesh.column)).unwrap();
    assert!(flat_names(&index(&doc, "default")).iter().all(|n| n != "mesh"));
    assert!(doc.source().contains("{/*<deleted>"));

    doc.edit(|b| b.restore_element(mesh.line, mesh.column).map(|_| ()))
        .unwrap();
    assert_eq!(doc.source(), source);
}

#[test]
fn test_nested_soft_delete_round_trips() {
    let source = "export default function Scene() {\n  return (\n    <group>\n      <mesh />\n    </group>\n  );\n}\n";
    let mut doc = open(source);
    let nodes = index(&doc, "default");
    let group = nodes[0].clone();
    let mesh = nodes[0].children[0].clone();

    doc.edit(|b| b.delete_element(mesh.line, mesh.column)).unwrap();
    let after_inner_delete = doc.source().to_string();

    doc.edit(|b| b.delete_element(group.line, group.column)).unwrap();
    assert!(flat_names(&index(&doc, "default")).is_empty());

    doc.edit(|b| b.restore_element(group.line, group.column).map(|_| ()))
        .unwrap();
    assert_eq!(doc.source(), after_inner_delete);

    doc.edit(|b| b.restore_element(mesh.line, mesh.column).map(|_| ()))
        .unwrap();
    assert_eq!(doc.source(), source);
}

#[test]
fn test_rename_rewrites_declaration_and_references() {
    let mut doc = open(
        "function Lamp() {\n  return <mesh />;\n}\nexport default function Scene() {\n  return <Lamp></Lamp>;\n}\n",
    );
    doc.edit(|b| b.rename_declaration("Lamp", "Beacon")).unwrap();

    assert!(!doc.source().contains("Lamp"));
    assert!(doc.source().contains("function Beacon()"));
    assert!(doc.source().contains("<Beacon></Beacon>"));
}

#[test]
fn test_rename_leaves_import_export_names_alone() {
    let mut doc = open(
        "import { Lamp as Bulb } from \"./lamp\";\nfunction Lamp() {\n  return <mesh />;\n}\nexport default function Scene() {\n  return (\n    <>\n      <Lamp />\n      <Bulb />\n    </>\n  );\n}\n",
    );
    doc.edit(|b| b.rename_declaration("Lamp", "Beacon")).unwrap();

    // the import's export-name side is untouched
    assert!(doc.source().contains("import { Lamp as Bulb }"));
    assert!(doc.source().contains("<Beacon />"));
    assert!(doc.source().contains("<Bulb />"));
}

#[test]
fn test_rename_leaves_attribute_names_alone() {
    let mut doc = open(
        "const scale = 2;\nexport default function Scene() {\n  return <mesh scale={scale} />;\n}\n",
    );
    doc.edit(|b| b.rename_declaration("scale", "zoom")).unwrap();

    // attribute name untouched, the reference inside the container renamed
    assert!(doc.source().contains("const zoom = 2;"));
    assert!(doc.source().contains("<mesh scale={zoom} />"));
}

#[test]
fn test_rename_missing_declaration_is_hard_error() {
    let mut doc = open("export default function Scene(){ return <><mesh/></> }");
    let result = doc.edit(|b| b.rename_declaration("Nope", "Else"));
    assert!(result.is_err());
}

#[test]
fn test_upsert_updates_value_and_preserves_sibling_lines() {
    let mut doc = open(
        "export default function Scene() {\n  return (\n    <>\n      <mesh\n        position={[\n          0,\n          1,\n          0\n        ]}\n      />\n      <group />\n    </>\n  );\n}\n",
    );
    let before = index(&doc, "default");
    let mesh = before[0].clone();
    let group_line = before[1].line;

    doc.edit(|b| b.upsert_attribute(mesh.line, mesh.column, "position", &json!([1, 2, 3])))
        .unwrap();

    assert!(doc.source().contains("position={[1, 2, 3]}"));
    let after = index(&doc, "default");
    assert_eq!(after[1].name, "group");
    assert_eq!(after[1].line, group_line);
}

#[test]
fn test_upsert_adds_missing_attribute() {
    let mut doc = open("export default function Scene(){ return <><mesh/></> }");
    let mesh = index(&doc, "default")[0].clone();
    doc.edit(|b| b.upsert_attribute(mesh.line, mesh.column, "scale", &json!(2)))
        .unwrap();
    assert!(doc.source().contains("<mesh scale={2}/>"));
}

#[test]
fn test_restore_inside_multibyte_character_is_hard_error() {
    let mut doc =
        open("export default function Scene() {\n  return <mesh name=\"héllo\" />;\n}\n");
    // column 23 lands on the second byte of the two-byte "é"
    let result = doc.edit(|b| b.restore_element(2, 23).map(|_| ()));
    assert!(matches!(
        result,
        Err(stagehand_editor::EditError::DeletedElementNotFound { .. })
    ));
}

#[test]
fn test_stale_position_is_hard_error() {
    let mut doc = open("export default function Scene(){ return <><mesh/></> }");
    let result = doc.edit(|b| b.duplicate(40, 2));
    assert!(result.is_err());
    // failed transaction left the document untouched
    assert!(!doc.is_dirty());
}
