use repograph_lang::FrontEnd;
use tracing::debug;

use crate::types::{Entity, EntityKind, RawImport, RawInherit, RelationKind, Relationship, Span};

/// Everything one file contributes to the graph in the declaration pass:
/// its entities, its CONTAINS edges, and the raw records queued for the
/// later resolution passes.
#[derive(Debug, Default)]
pub struct FileExtraction {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub imports: Vec<RawImport>,
    pub inherits: Vec<RawInherit>,
}

/// Extract one file's top-level declarations.
///
/// `file_name` is the File entity's identity (repository-relative path).
/// Declarations are named `file_name:Ident`; methods one level deep are
/// named `file_name:Class.method`. Deeper nesting stays inside the
/// containing declaration's captured body text.
pub fn extract_file(
    front_end: &dyn FrontEnd,
    file_name: &str,
    source: &str,
) -> crate::error::Result<FileExtraction> {
    let tree = front_end.parse(source)?;
    let outline = front_end.outline(&tree, source);

    let mut out = FileExtraction::default();

    let mut file_entity = Entity::new(EntityKind::File, file_name);
    file_entity.source = source.to_string();

    for import in outline.imports {
        out.imports.push(RawImport {
            file: file_name.to_string(),
            specifier: import.specifier,
            imported: import.imported,
            alias: import.alias,
        });
    }

    for var in outline.variables {
        let mut entity = Entity::new(EntityKind::Variable, format!("{file_name}:{}", var.name));
        entity.source = var.text;
        entity.span = Some(Span::from(var.range));
        out.relationships.push(Relationship::new(
            RelationKind::Contains,
            &file_entity,
            &entity,
        ));
        out.entities.push(entity);
    }

    for func in outline.functions {
        let mut entity = Entity::new(EntityKind::Function, format!("{file_name}:{}", func.name));
        entity.source = func.text;
        entity.span = Some(Span::from(func.range));
        out.relationships.push(Relationship::new(
            RelationKind::Contains,
            &file_entity,
            &entity,
        ));
        out.entities.push(entity);
    }

    for class in outline.classes {
        let class_name = format!("{file_name}:{}", class.name);
        let mut class_entity = Entity::new(EntityKind::Class, class_name.clone());
        class_entity.source = class.text;
        class_entity.span = Some(Span::from(class.range));
        out.relationships.push(Relationship::new(
            RelationKind::Contains,
            &file_entity,
            &class_entity,
        ));

        for base in class.bases {
            out.inherits.push(RawInherit {
                class_name: class_name.clone(),
                file: file_name.to_string(),
                superclass: base,
            });
        }

        for method in class.methods {
            let mut entity = Entity::new(
                EntityKind::Function,
                format!("{class_name}.{}", method.name),
            );
            entity.source = method.text;
            entity.span = Some(Span::from(method.range));
            out.relationships.push(Relationship::new(
                RelationKind::Contains,
                &class_entity,
                &entity,
            ));
            out.entities.push(entity);
        }

        out.entities.push(class_entity);
    }

    debug!(
        file = file_name,
        entities = out.entities.len(),
        imports = out.imports.len(),
        "Extracted file declarations"
    );

    out.entities.push(file_entity);
    Ok(out)
}
