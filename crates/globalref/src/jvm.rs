//! [`HostEnv`] for a JNI environment
//!
//! Calls go straight through the raw JNI function table. The `jni` crate's
//! own `GlobalRef`/`WeakRef` wrappers delete on drop, which is the wrong
//! ownership model for handles the managed side owns.
//!
//! Local frames on a JNI environment go through [`with_local_frame`] and
//! [`with_local_frame_returning_local`]. Their closures get an environment
//! with a fresh lifetime, so no local made inside can outlive the frame.

use std::ffi::CString;

use jni::objects::JObject;
use jni::sys::{self, jint, jlong, jobject, jobjectRefType};
use jni::JNIEnv;

use crate::frame::LocalFrame;
use crate::handle::RefKind;
use crate::host::HostEnv;

/// Call an entry of the JNI function table.
///
/// Must be used inside `unsafe`. A missing entry aborts the process.
macro_rules! jni_call {
    ($env:expr, $name:ident $(, $arg:expr)* $(,)?) => {{
        let raw: *mut sys::JNIEnv = $env.get_raw();
        match (**raw).$name {
            Some(function) => function(raw $(, $arg)*),
            None => missing_function(stringify!($name)),
        }
    }};
}

fn missing_function(name: &str) -> ! {
    tracing::error!(function = name, "JNI function table entry missing");
    std::process::abort()
}

/// A JNI local reference, valid for `'local`.
///
/// This is the [`HostEnv::Local`] of [`JNIEnv`]. Like `JObject` it is not
/// `Copy`, so handing it to `JNIEnv::delete_local_ref` through
/// [`JvmLocal::into_object`] ends its use. It does not delete the reference
/// when dropped; the enclosing native frame owns it.
#[derive(Debug)]
#[repr(transparent)]
pub struct JvmLocal<'local>(JObject<'local>);

impl<'local> JvmLocal<'local> {
    /// The null reference.
    pub fn null() -> Self {
        Self(JObject::null())
    }

    /// Borrow the reference behind a `JObject`.
    ///
    /// The result lives no longer than the borrow, so `obj` cannot be
    /// deleted while it is in use:
    ///
    /// ```compile_fail
    /// use globalref::{create_strong_ref, JvmLocal};
    /// use jni::JNIEnv;
    ///
    /// fn dangle(env: &mut JNIEnv<'_>) -> jni::errors::Result<()> {
    ///     let obj = env.new_object("java/lang/Object", "()V", &[])?;
    ///     let local = JvmLocal::from_object(&obj);
    ///     env.delete_local_ref(obj)?;
    ///     create_strong_ref(&*env, &local);
    ///     Ok(())
    /// }
    /// ```
    pub fn from_object<'obj>(obj: &'local JObject<'obj>) -> Self
    where
        'obj: 'local,
    {
        // SAFETY: obj is a live local for at least 'local
        unsafe { Self::from_raw(obj.as_raw()) }
    }

    /// Wrap a raw local reference.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a local reference valid for `'local`.
    pub unsafe fn from_raw(raw: jobject) -> Self {
        Self(JObject::from_raw(raw))
    }

    /// The raw reference.
    pub fn as_raw(&self) -> jobject {
        self.0.as_raw()
    }

    /// Borrow as a `JObject` for use with the `jni` crate's API.
    pub fn as_object(&self) -> &JObject<'local> {
        &self.0
    }

    /// Convert into a `JObject` for use with the `jni` crate's API.
    pub fn into_object(self) -> JObject<'local> {
        self.0
    }
}

/// Run `f` inside a fresh local frame with room for `capacity` locals.
///
/// Locals made through the environment `f` receives cannot leave the
/// closure, so they are all freed when it returns:
///
/// ```compile_fail
/// use globalref::jvm::{with_local_frame, JvmLocal};
/// use globalref::{resolve, RefHandle};
/// use jni::JNIEnv;
///
/// fn leak<'local>(env: &JNIEnv<'local>, handle: &RefHandle) -> JvmLocal<'local> {
///     with_local_frame(env, 4, |env| resolve(env, handle))
/// }
/// ```
///
/// Use [`with_local_frame_returning_local`] to carry one local out.
pub fn with_local_frame<'local, T, F>(env: &JNIEnv<'local>, capacity: i32, f: F) -> T
where
    F: for<'frame> FnOnce(&JNIEnv<'frame>) -> T,
{
    // SAFETY: locals created by f are bound to its 'frame and cannot escape
    let _frame = unsafe { LocalFrame::push_unchecked(env, capacity) };
    f(env)
}

/// Like [`with_local_frame`], but carries the local `f` returns into the
/// enclosing frame.
///
/// ```no_run
/// use globalref::jvm::{with_local_frame_returning_local, JvmLocal};
/// use globalref::{resolve, RefHandle};
/// use jni::JNIEnv;
///
/// fn last_of_many<'local>(env: &JNIEnv<'local>, handle: &RefHandle) -> JvmLocal<'local> {
///     with_local_frame_returning_local(env, 4, |env| {
///         for _ in 0..100 {
///             resolve(env, handle);
///         }
///         resolve(env, handle)
///     })
/// }
/// ```
pub fn with_local_frame_returning_local<'local, F>(
    env: &JNIEnv<'local>,
    capacity: i32,
    f: F,
) -> JvmLocal<'local>
where
    F: for<'frame> FnOnce(&JNIEnv<'frame>) -> JvmLocal<'frame>,
{
    // SAFETY: locals created by f are bound to its 'frame; the only one
    // that leaves is the result, which pop_with moves to the outer frame
    let frame = unsafe { LocalFrame::push_unchecked(env, capacity) };
    let result = f(env);
    frame.pop_with(result)
}

impl<'local> HostEnv for JNIEnv<'local> {
    type Local = JvmLocal<'local>;

    fn null_local(&self) -> JvmLocal<'local> {
        JvmLocal::null()
    }

    fn is_null(&self, obj: &JvmLocal<'local>) -> bool {
        obj.as_raw().is_null()
    }

    fn new_global_ref(&self, obj: &JvmLocal<'local>) -> i64 {
        // SAFETY: obj is a live local of this environment
        unsafe { jni_call!(self, NewGlobalRef, obj.as_raw()) as jlong }
    }

    fn new_weak_global_ref(&self, obj: &JvmLocal<'local>) -> i64 {
        // SAFETY: obj is a live local of this environment
        unsafe { jni_call!(self, NewWeakGlobalRef, obj.as_raw()) as jlong }
    }

    unsafe fn delete_global_ref(&self, raw: i64) {
        jni_call!(self, DeleteGlobalRef, raw as jobject)
    }

    unsafe fn delete_weak_global_ref(&self, raw: i64) {
        jni_call!(self, DeleteWeakGlobalRef, raw as jobject)
    }

    unsafe fn new_local_ref(&self, raw: i64) -> JvmLocal<'local> {
        JvmLocal::from_raw(jni_call!(self, NewLocalRef, raw as jobject))
    }

    unsafe fn ref_kind(&self, raw: i64) -> Option<RefKind> {
        if raw == 0 {
            return None;
        }
        match jni_call!(self, GetObjectRefType, raw as jobject) {
            jobjectRefType::JNIGlobalRefType => Some(RefKind::Strong),
            jobjectRefType::JNIWeakGlobalRefType => Some(RefKind::Weak),
            _ => None,
        }
    }

    fn push_local_frame(&self, capacity: i32) -> bool {
        // SAFETY: pushing a frame has no preconditions
        unsafe { jni_call!(self, PushLocalFrame, capacity as jint) == sys::JNI_OK }
    }

    unsafe fn pop_local_frame(&self, result: JvmLocal<'local>) -> JvmLocal<'local> {
        JvmLocal::from_raw(jni_call!(self, PopLocalFrame, result.as_raw()))
    }

    #[allow(unreachable_code)]
    fn fatal_error(&self, msg: &str) -> ! {
        let msg = CString::new(msg).unwrap_or_default();
        // SAFETY: msg is a valid C string for the duration of the call
        unsafe {
            jni_call!(self, FatalError, msg.as_ptr());
        }
        std::process::abort()
    }
}
