//! Integration tests for dtsmock-syntax using platform-style declaration files.

use dtsmock_syntax::{
    parse, ClassMember, DtsExport, DtsItem, DtsType, InterfaceMember, ModuleName, Reference,
};

/// A typical `@ohos.*` module: imports, a namespace with overloads and a default export.
#[test]
fn test_platform_module_file() {
    let dts = r#"
        /// <reference path="../component/units.d.ts" />
        import { AsyncCallback, Callback } from './@ohos.base';
        import type Want from './@ohos.app.ability.Want';

        /**
         * Battery information.
         * @since 9
         */
        declare namespace batteryInfo {
            const batterySOC: number;

            function getCapacity(callback: AsyncCallback<number>): void;
            function getCapacity(): Promise<number>;

            export enum BatteryHealthState {
                UNKNOWN = 0,
                GOOD,
                OVERHEAT
            }

            interface ChargeInfo {
                level: number;
                on(type: 'change', callback: Callback<ChargeInfo>): void;
            }
        }

        export default batteryInfo;
    "#;

    let file = parse(dts).expect("Failed to parse platform module");

    assert_eq!(file.references, vec![Reference::Path("../component/units.d.ts".into())]);
    assert_eq!(file.items.len(), 4, "two imports, the namespace and the default export");

    let DtsItem::Module(module) = &file.items[2] else {
        panic!("expected namespace, got {:?}", file.items[2]);
    };
    assert_eq!(module.name, ModuleName::Ident("batteryInfo".into()));
    assert!(module.modifiers.declare);

    let body = module.body.as_ref().expect("namespace has a body");
    let functions = body
        .iter()
        .filter(|item| matches!(item, DtsItem::Function(f) if f.name == "getCapacity"))
        .count();
    assert_eq!(functions, 2, "both overloads are kept");

    assert_eq!(
        file.items[3],
        DtsItem::Export(DtsExport::Default("batteryInfo".into()))
    );
}

/// A system-style file with no module wrapper.
#[test]
fn test_module_less_file() {
    let dts = r#"
        export interface FetchResponse {
            code: number;
            data: string | object;
            headers: Object;
        }

        export default class Fetch {
            static fetch(options: FetchOptions): void;
        }
    "#;

    let file = parse(dts).expect("Failed to parse module-less file");
    assert_eq!(file.items.len(), 2);

    let DtsItem::Interface(iface) = &file.items[0] else {
        panic!("expected interface");
    };
    let InterfaceMember::Property(data) = &iface.members[1] else {
        panic!("expected property");
    };
    assert!(matches!(
        data.ty.as_ref().map(|t| &t.ty),
        Some(DtsType::Union(types)) if types.len() == 2
    ));

    let DtsItem::Class(class) = &file.items[1] else {
        panic!("expected class");
    };
    assert!(class.modifiers.default);
    assert!(matches!(&class.members[0], ClassMember::Method(m) if m.is_static));
}

/// Statements outside the declaration grammar are skipped without losing what follows.
#[test]
fn test_recovery_keeps_following_declarations() {
    let dts = r#"
        declare function before(): void;
        if (x) { y(); }
        declare function after(): string;
    "#;

    let file = parse(dts).expect("Failed to parse with recovery");
    let names: Vec<_> = file
        .items
        .iter()
        .filter_map(|item| match item {
            DtsItem::Function(f) => Some(f.name.as_str()),
            _ => None,
        })
        .collect();

    assert_eq!(names, ["before", "after"]);
    assert!(file.items.iter().any(|item| matches!(item, DtsItem::Unsupported(_))));
}

/// Generic helpers used throughout the platform declarations.
#[test]
fn test_generic_and_import_types() {
    let dts = r#"
        type Context = import('../application/Context').default;
        declare function entries(): IterableIterator<[string, number]>;
        declare function read(buf: ArrayBuffer, cb: (err: Error, n?: number) => void): Promise<Array<Uint8Array>>;
    "#;

    let file = parse(dts).expect("Failed to parse generic declarations");
    assert_eq!(file.items.len(), 3);

    let DtsItem::Function(entries) = &file.items[1] else {
        panic!("expected function");
    };
    let Some(DtsType::Named { name, type_args }) = entries.return_type.as_ref().map(|t| &t.ty) else {
        panic!("expected named return type");
    };
    assert_eq!(name, "IterableIterator");
    assert!(matches!(&type_args[0], DtsType::Tuple(elements) if elements.len() == 2));

    let DtsItem::Function(read) = &file.items[2] else {
        panic!("expected function");
    };
    assert!(matches!(
        read.params[1].ty.as_ref().map(|t| &t.ty),
        Some(DtsType::Function(_))
    ));
}

/// Unterminated declarations surface as errors with a position.
#[test]
fn test_error_reports_position() {
    let err = parse("declare class Broken extends {").unwrap_err();
    assert!(err.pos > 0);
}
