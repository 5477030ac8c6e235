//! Tests against a real JVM through the invocation API
//!
//! Run with `--features invocation` (needs a JDK).

#![cfg(feature = "invocation")]

use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

use globalref::exports::{
    Java_net_hollowcube_luau_util_GlobalRef_get, Java_net_hollowcube_luau_util_GlobalRef_getweak,
    Java_net_hollowcube_luau_util_GlobalRef_newref,
    Java_net_hollowcube_luau_util_GlobalRef_newweakref,
    Java_net_hollowcube_luau_util_GlobalRef_unref,
    Java_net_hollowcube_luau_util_JNIRefTest_get, Java_net_hollowcube_luau_util_JNIRefTest_newref,
    Java_net_hollowcube_luau_util_JNIRefTest_unref,
};
use globalref::jvm::{with_local_frame, with_local_frame_returning_local};
use globalref::*;
use jni::objects::{JClass, JObject};
use jni::{InitArgsBuilder, JNIEnv, JNIVersion, JavaVM};

fn jvm() -> &'static JavaVM {
    static JVM: OnceLock<JavaVM> = OnceLock::new();
    JVM.get_or_init(|| {
        let args = InitArgsBuilder::new()
            .version(JNIVersion::V8)
            .option("-Xcheck:jni")
            .build()
            .expect("invalid JVM init args");
        JavaVM::new(args).expect("failed to start JVM")
    })
}

fn new_object<'local>(env: &mut JNIEnv<'local>) -> anyhow::Result<JObject<'local>> {
    Ok(env.new_object("java/lang/Object", "()V", &[])?)
}

fn force_gc(env: &mut JNIEnv<'_>) -> anyhow::Result<()> {
    env.call_static_method("java/lang/System", "gc", "()V", &[])?;
    Ok(())
}

fn no_class<'local>() -> JClass<'local> {
    JClass::from(JObject::null())
}

// ═══════════════════════════════════════════════════════════════════════
// Typed Bridge
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_strong_ref_identity() -> anyhow::Result<()> {
    let mut env = jvm().attach_current_thread()?;
    let a = new_object(&mut env)?;

    let handle = create_strong_ref(&*env, &JvmLocal::from_object(&a)).unwrap();
    for _ in 0..5 {
        let local = resolve(&*env, &handle).into_object();
        assert!(env.is_same_object(&local, &a)?);
        env.delete_local_ref(local)?;
    }

    release(&*env, handle);
    Ok(())
}

#[test]
fn test_strong_ref_survives_gc() -> anyhow::Result<()> {
    let mut env = jvm().attach_current_thread()?;
    let obj = new_object(&mut env)?;
    let strong = create_strong_ref(&*env, &JvmLocal::from_object(&obj)).unwrap();
    let weak = create_weak_ref(&*env, &JvmLocal::from_object(&obj)).unwrap();
    env.delete_local_ref(obj)?;

    force_gc(&mut env)?;
    assert!(resolve_weak(&*env, &weak).is_some());

    release(&*env, strong);
    release(&*env, weak);
    Ok(())
}

#[test]
fn test_weak_ref_eventually_gone() -> anyhow::Result<()> {
    let mut env = jvm().attach_current_thread()?;
    let obj = new_object(&mut env)?;
    let weak = create_weak_ref(&*env, &JvmLocal::from_object(&obj)).unwrap();
    env.delete_local_ref(obj)?;

    let mut gone = false;
    for _ in 0..20 {
        force_gc(&mut env)?;
        match resolve_weak(&*env, &weak) {
            None => {
                gone = true;
                break;
            }
            Some(local) => env.delete_local_ref(local.into_object())?,
        }
        thread::sleep(Duration::from_millis(25));
    }
    assert!(gone, "weak referent was never collected");

    release(&*env, weak);
    Ok(())
}

#[test]
fn test_create_release_cycles() -> anyhow::Result<()> {
    let mut env = jvm().attach_current_thread()?;
    let obj = new_object(&mut env)?;
    let local = JvmLocal::from_object(&obj);

    for _ in 0..10_000 {
        let strong = create_strong_ref(&*env, &local).unwrap();
        let weak = create_weak_ref(&*env, &local).unwrap();
        release(&*env, strong);
        release(&*env, weak);
    }
    Ok(())
}

#[test]
fn test_local_frame_with_jvm() -> anyhow::Result<()> {
    let mut env = jvm().attach_current_thread()?;
    let obj = new_object(&mut env)?;
    let handle = create_strong_ref(&*env, &JvmLocal::from_object(&obj)).unwrap();

    let kept = with_local_frame_returning_local(&*env, 8, |env| {
        for _ in 0..64 {
            resolve(env, &handle);
        }
        resolve(env, &handle)
    });
    assert!(env.is_same_object(kept.as_object(), &obj)?);

    release(&*env, handle);
    Ok(())
}

#[test]
fn test_local_carried_out_of_frame_is_usable() -> anyhow::Result<()> {
    let mut env = jvm().attach_current_thread()?;
    let obj = new_object(&mut env)?;
    let handle = create_strong_ref(&*env, &JvmLocal::from_object(&obj)).unwrap();

    let carried = with_local_frame_returning_local(&*env, 4, |env| resolve(env, &handle));
    // -Xcheck:jni aborts here if the local did not survive the pop
    let again = create_strong_ref(&*env, &carried).unwrap();
    release(&*env, again);

    release(&*env, handle);
    Ok(())
}

#[test]
fn test_local_frame_returns_plain_values() -> anyhow::Result<()> {
    let mut env = jvm().attach_current_thread()?;
    let obj = new_object(&mut env)?;
    let weak = create_weak_ref(&*env, &JvmLocal::from_object(&obj)).unwrap();

    let alive = with_local_frame(&*env, 4, |env| resolve_weak(env, &weak).is_some());
    assert!(alive);

    release(&*env, weak);
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// Exported Entry Points
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_globalref_exports() -> anyhow::Result<()> {
    let mut env = jvm().attach_current_thread()?;
    let obj = new_object(&mut env)?;

    let (strong, weak) = unsafe {
        let strong = Java_net_hollowcube_luau_util_GlobalRef_newref(
            env.unsafe_clone(),
            no_class(),
            JObject::from_raw(obj.as_raw()),
        );
        let weak = Java_net_hollowcube_luau_util_GlobalRef_newweakref(
            env.unsafe_clone(),
            no_class(),
            JObject::from_raw(obj.as_raw()),
        );
        (strong, weak)
    };
    assert_ne!(strong, 0);
    assert_ne!(weak, 0);

    let (via_strong, via_weak) = unsafe {
        (
            JObject::from_raw(Java_net_hollowcube_luau_util_GlobalRef_get(
                env.unsafe_clone(),
                no_class(),
                strong,
            )),
            JObject::from_raw(Java_net_hollowcube_luau_util_GlobalRef_getweak(
                env.unsafe_clone(),
                no_class(),
                weak,
            )),
        )
    };
    assert!(env.is_same_object(&via_strong, &obj)?);
    assert!(env.is_same_object(&via_weak, &obj)?);

    unsafe {
        Java_net_hollowcube_luau_util_GlobalRef_unref(env.unsafe_clone(), no_class(), weak);
        Java_net_hollowcube_luau_util_GlobalRef_unref(env.unsafe_clone(), no_class(), strong);
    }
    Ok(())
}

#[test]
fn test_exports_treat_zero_as_no_handle() -> anyhow::Result<()> {
    let env = jvm().attach_current_thread()?;

    unsafe {
        assert_eq!(
            Java_net_hollowcube_luau_util_GlobalRef_newref(
                env.unsafe_clone(),
                no_class(),
                JObject::null()
            ),
            0
        );
        assert!(Java_net_hollowcube_luau_util_GlobalRef_get(env.unsafe_clone(), no_class(), 0)
            .is_null());
        assert!(
            Java_net_hollowcube_luau_util_GlobalRef_getweak(env.unsafe_clone(), no_class(), 0)
                .is_null()
        );
        Java_net_hollowcube_luau_util_GlobalRef_unref(env.unsafe_clone(), no_class(), 0);
    }
    Ok(())
}

#[test]
fn test_jnireftest_exports() -> anyhow::Result<()> {
    let mut env = jvm().attach_current_thread()?;
    let obj = new_object(&mut env)?;

    let raw = unsafe {
        Java_net_hollowcube_luau_util_JNIRefTest_newref(
            env.unsafe_clone(),
            no_class(),
            JObject::from_raw(obj.as_raw()),
        )
    };
    let back = unsafe {
        JObject::from_raw(Java_net_hollowcube_luau_util_JNIRefTest_get(
            env.unsafe_clone(),
            no_class(),
            raw,
        ))
    };
    assert!(env.is_same_object(&back, &obj)?);

    unsafe { Java_net_hollowcube_luau_util_JNIRefTest_unref(env.unsafe_clone(), no_class(), raw) };
    Ok(())
}
