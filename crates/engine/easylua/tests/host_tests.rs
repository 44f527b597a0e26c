//! Lua host integration: linked bundles, inheritance and param injection
#![cfg(feature = "lua")]

use easylua::mlua::Table;
use easylua::{
    merge_params, CastValue, FieldResolver, InstanceId, LuaHost, LuaParam, ObjectId, ObjectRef,
    ScriptLinker,
};
use std::collections::HashMap;

const UNIT: &str = r#"---@class Unit
---@field public speed number
Unit = {}

function Unit:move(dt)
    self.travelled = (self.travelled or 0) + self.speed * dt
end
"#;

const ENEMY: &str = r#"---@class Enemy: Unit
---@field public hp number
---@field public target Enemy
Enemy = {}

function Enemy:target_hp()
    self.seen_hp = self.target.hp
end
"#;

const HELPERS: &str = "function double(x) return x * 2 end";

/// Helper: link the test scripts, derived class first
fn linked_host() -> LuaHost {
    let mut linker = ScriptLinker::new();
    linker.add_scripts([ENEMY, HELPERS, UNIT]).unwrap();

    let mut host = LuaHost::new().unwrap();
    host.load_bundle(&linker.linked_bundle()).unwrap();
    host
}

#[test]
fn test_bundle_registers_classes() {
    let mut host = linked_host();
    assert!(host.is_class_registered("Unit").unwrap());
    assert!(host.is_class_registered("Enemy").unwrap());

    host.exec_string("doubled = double(21)").unwrap();
    let doubled: i64 = host.get_global("doubled").unwrap();
    assert_eq!(doubled, 42);
}

#[test]
fn test_inherited_method_uses_pushed_params() {
    let mut host = linked_host();
    let enemy = host.new_instance("Enemy", &[]).unwrap();

    let mut sources = HashMap::new();
    sources.insert("Enemy".to_string(), ENEMY.to_string());
    sources.insert("Unit".to_string(), UNIT.to_string());
    let resolved = FieldResolver::new(&sources).resolve("Enemy").unwrap();

    let saved = vec![
        LuaParam::new("speed", "number").with_value(2.5f32),
        LuaParam::new("hp", "number").with_value(40i64),
    ];
    let params = merge_params(&saved, &resolved.fields);
    let resolver: HashMap<ObjectId, InstanceId> = HashMap::new();

    // target has no value and is skipped
    assert_eq!(host.push_params(enemy, &params, &resolver).unwrap(), 2);

    assert!(host.call_method(enemy, "move", &[CastValue::Float(2.0)]).unwrap());
    let travelled: f64 = host.get_field(enemy, "travelled").unwrap();
    assert_eq!(travelled, 5.0);
}

#[test]
fn test_behaviour_reference_resolves_to_instance() {
    let mut host = linked_host();
    let leader = host.new_instance("Enemy", &[]).unwrap();
    let follower = host.new_instance("Enemy", &[]).unwrap();
    host.set_field(leader, "hp", &CastValue::Int(80)).unwrap();

    let mut behaviours = HashMap::new();
    behaviours.insert(ObjectId(10), leader);

    let params = vec![
        LuaParam::new("target", "Enemy").with_value(ObjectRef::Behaviour(ObjectId(10))),
    ];
    assert_eq!(host.push_params(follower, &params, &behaviours).unwrap(), 1);

    assert!(host.call_method(follower, "target_hp", &[]).unwrap());
    let seen: i64 = host.get_field(follower, "seen_hp").unwrap();
    assert_eq!(seen, 80);

    let target: Table = host.get_field(follower, "target").unwrap();
    assert_eq!(&target, host.instance(leader).unwrap());
}

#[test]
fn test_unresolved_behaviour_is_not_pushed() {
    let mut host = linked_host();
    let follower = host.new_instance("Enemy", &[]).unwrap();

    let params = vec![
        LuaParam::new("target", "Enemy").with_value(ObjectRef::Behaviour(ObjectId(99))),
    ];
    let behaviours: HashMap<ObjectId, InstanceId> = HashMap::new();
    assert_eq!(host.push_params(follower, &params, &behaviours).unwrap(), 0);
}
