//! JNI entry points
//!
//! Two managed classes bind to this library:
//!
//! * `net.hollowcube.luau.util.GlobalRef`: `newref`, `newweakref`,
//!   `unref`, `get`, `getweak`
//! * `net.hollowcube.luau.util.JNIRefTest`: `newref`, `unref`, `get`
//!
//! Both share one implementation. Each entry point trusts its caller to
//! pass only values it got back from this library and to release each one
//! once.
//!
//! The symbols only bind if the managed class loads this library. A
//! `JNIRefTest` whose static initializer calls
//! `System.loadLibrary("jnitest")` fails before reaching them; it has to
//! load `globalref` instead.

#![allow(non_snake_case)]

use std::ffi::c_void;

use jni::objects::{JClass, JObject};
use jni::sys::{jint, jlong, jobject, JNI_VERSION_1_6};
use jni::{JNIEnv, JavaVM};

use crate::boundary;
use crate::config::BridgeConfig;
use crate::jvm::JvmLocal;
use crate::logging::init_logging;

/// Library load hook: set up logging and require JNI 1.6.
#[no_mangle]
pub extern "system" fn JNI_OnLoad(_vm: JavaVM, _reserved: *mut c_void) -> jint {
    let (config, config_error) = match BridgeConfig::from_env() {
        Ok(config) => (config, None),
        Err(err) => (BridgeConfig::default(), Some(err)),
    };

    if let Err(err) = init_logging(&config.log) {
        tracing::debug!(error = %err, "keeping existing tracing subscriber");
    }
    if let Some(err) = config_error {
        tracing::warn!(error = %err, "ignoring invalid logging configuration");
    }

    tracing::info!(version = crate::VERSION, "globalref loaded");
    JNI_VERSION_1_6
}

// ═══════════════════════════════════════════════════════════════════════
// net.hollowcube.luau.util.GlobalRef
// ═══════════════════════════════════════════════════════════════════════

/// `static native long newref(Object obj)`
#[no_mangle]
pub extern "system" fn Java_net_hollowcube_luau_util_GlobalRef_newref<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    target: JObject<'local>,
) -> jlong {
    boundary::newref(&env, &JvmLocal::from_object(&target))
}

/// `static native long newweakref(Object obj)`
#[no_mangle]
pub extern "system" fn Java_net_hollowcube_luau_util_GlobalRef_newweakref<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    target: JObject<'local>,
) -> jlong {
    boundary::newweakref(&env, &JvmLocal::from_object(&target))
}

/// `static native void unref(long ref)`
#[no_mangle]
pub extern "system" fn Java_net_hollowcube_luau_util_GlobalRef_unref<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    raw: jlong,
) {
    // SAFETY: the managed caller only passes values from newref/newweakref, once
    unsafe { boundary::unref(&env, raw) }
}

/// `static native Object get(long ref)`
#[no_mangle]
pub extern "system" fn Java_net_hollowcube_luau_util_GlobalRef_get<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    raw: jlong,
) -> jobject {
    // SAFETY: the managed caller only passes live values from newref
    unsafe { boundary::get(&env, raw) }.as_raw()
}

/// `static native Object getweak(long ref)`
#[no_mangle]
pub extern "system" fn Java_net_hollowcube_luau_util_GlobalRef_getweak<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    raw: jlong,
) -> jobject {
    // SAFETY: the managed caller only passes live values from newweakref
    unsafe { boundary::getweak(&env, raw) }.as_raw()
}

// ═══════════════════════════════════════════════════════════════════════
// net.hollowcube.luau.util.JNIRefTest
// ═══════════════════════════════════════════════════════════════════════

// Bound only when JNIRefTest loads `globalref` rather than `jnitest`.

/// `static native long newref(Object obj)`
#[no_mangle]
pub extern "system" fn Java_net_hollowcube_luau_util_JNIRefTest_newref<'local>(
    env: JNIEnv<'local>,
    class: JClass<'local>,
    target: JObject<'local>,
) -> jlong {
    Java_net_hollowcube_luau_util_GlobalRef_newref(env, class, target)
}

/// `static native void unref(long ref)`
#[no_mangle]
pub extern "system" fn Java_net_hollowcube_luau_util_JNIRefTest_unref<'local>(
    env: JNIEnv<'local>,
    class: JClass<'local>,
    raw: jlong,
) {
    Java_net_hollowcube_luau_util_GlobalRef_unref(env, class, raw)
}

/// `static native Object get(long ref)`
#[no_mangle]
pub extern "system" fn Java_net_hollowcube_luau_util_JNIRefTest_get<'local>(
    env: JNIEnv<'local>,
    class: JClass<'local>,
    raw: jlong,
) -> jobject {
    Java_net_hollowcube_luau_util_GlobalRef_get(env, class, raw)
}
