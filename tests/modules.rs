//! End-to-end module linking/evaluation through the public API: a root
//! module importing a named export from a host-resolved dependency.

use ecmarune::{
    ast::{
        BindingPattern, DeclarationKind, ExportDeclaration, ExportEntry, Expression, Identifier, ImportDeclaration,
        ImportEntry, Literal, Module, ModuleItem, Program, Span, Statement, VariableDeclaration, VariableDeclarator,
    },
    error::JsNativeError,
    Context, ModuleLoader,
};
use std::collections::HashMap;

struct StaticLoader {
    modules: HashMap<&'static str, Module>,
}

impl ModuleLoader for StaticLoader {
    fn resolve(&self, _referrer: Option<&str>, specifier: &str) -> ecmarune::JsResult<String> {
        Ok(specifier.to_string())
    }

    fn load(&self, resolved_specifier: &str) -> ecmarune::JsResult<Module> {
        self.modules
            .get(resolved_specifier)
            .cloned()
            .ok_or_else(|| JsNativeError::syntax().with_message("no such module").into())
    }
}

fn ident(name: &str) -> Identifier {
    Identifier::new(name, Span::default())
}

fn const_decl(name: &str, value: f64) -> Statement {
    Statement::VariableDeclaration(VariableDeclaration {
        kind: DeclarationKind::Const,
        span: Span::default(),
        declarations: vec![VariableDeclarator {
            pattern: BindingPattern::Identifier(ident(name)),
            init: Some(Expression::Literal(Literal::Number(value), Span::default())),
        }],
    })
}

#[test]
fn imports_a_named_export_and_reexports_it() {
    let mut context = Context::default();

    let mut modules = HashMap::new();
    modules.insert(
        "math",
        Module {
            body: vec![ModuleItem::Export(ExportDeclaration::Local(const_decl("pi", 3.0)))],
        },
    );
    context.set_module_loader(StaticLoader { modules });

    let root = Module {
        body: vec![
            ModuleItem::Import(ImportDeclaration {
                specifier: "math".into(),
                entries: vec![ImportEntry::Named {
                    imported: ident("pi"),
                    local: ident("pi"),
                }],
            }),
            ModuleItem::Export(ExportDeclaration::Named {
                entries: vec![ExportEntry {
                    local: ident("pi"),
                    exported: ident("pi"),
                }],
                from: None,
            }),
        ],
    };

    let namespace = context.evaluate(&Program::Module(root)).unwrap();
    let namespace = namespace.as_object().cloned().unwrap();
    let pi = namespace.get("pi", &mut context).unwrap();
    assert_eq!(pi.to_number(&mut context).unwrap(), 3.0);
}
