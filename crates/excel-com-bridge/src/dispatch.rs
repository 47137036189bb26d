//! Late-bound IDispatch access for the pieces of the Excel object model the
//! exporter reads.
//!
//! Everything goes through [`DispatchObject::invoke`]; the public helpers only
//! pick the dispatch flags and unwrap the result.

#![cfg(windows)]

use std::mem::ManuallyDrop;
use std::ptr;

use windows::{
    core::{BSTR, GUID, HSTRING, PCWSTR},
    Win32::{
        Foundation::{DISP_E_EXCEPTION, VARIANT_BOOL},
        Globalization::GetSystemDefaultLCID,
        System::{
            Com::{
                CLSIDFromProgID, CoCreateInstance, IDispatch, CLSCTX_LOCAL_SERVER, DISPATCH_FLAGS,
                DISPATCH_METHOD, DISPATCH_PROPERTYGET, DISPATCH_PROPERTYPUT, DISPPARAMS,
                EXCEPINFO,
            },
            Ole::DISPID_PROPERTYPUT,
            Variant::{
                VARIANT, VT_BOOL, VT_BSTR, VT_DISPATCH, VT_EMPTY, VT_ERROR, VT_I2, VT_I4, VT_NULL,
                VT_R4, VT_R8,
            },
        },
    },
};

// VARIANT keeps its unions behind ManuallyDrop; fields are written with
// ptr::write so no drop runs on the uninitialized payload.

pub fn variant_bool(val: bool) -> VARIANT {
    unsafe {
        let mut v = VARIANT::default();
        let inner = &mut *v.Anonymous.Anonymous;
        ptr::write(&mut inner.vt, VT_BOOL);
        ptr::write(
            &mut inner.Anonymous.boolVal,
            VARIANT_BOOL(if val { -1 } else { 0 }),
        );
        v
    }
}

pub fn variant_i32(val: i32) -> VARIANT {
    unsafe {
        let mut v = VARIANT::default();
        let inner = &mut *v.Anonymous.Anonymous;
        ptr::write(&mut inner.vt, VT_I4);
        ptr::write(&mut inner.Anonymous.lVal, val);
        v
    }
}

pub fn variant_str(val: &str) -> VARIANT {
    unsafe {
        let bstr = BSTR::from(val);
        let mut v = VARIANT::default();
        let inner = &mut *v.Anonymous.Anonymous;
        ptr::write(&mut inner.vt, VT_BSTR);
        ptr::write(&mut inner.Anonymous.bstrVal, ManuallyDrop::new(bstr));
        v
    }
}

fn variant_vt(v: &VARIANT) -> u16 {
    unsafe { v.Anonymous.Anonymous.vt.0 }
}

pub fn variant_get_bool(v: &VARIANT) -> Option<bool> {
    unsafe {
        (v.Anonymous.Anonymous.vt == VT_BOOL)
            .then(|| v.Anonymous.Anonymous.Anonymous.boolVal.0 != 0)
    }
}

/// Any numeric VARIANT widened to f64.
pub fn variant_get_f64(v: &VARIANT) -> Option<f64> {
    unsafe {
        let vt = v.Anonymous.Anonymous.vt;
        let anon = &v.Anonymous.Anonymous.Anonymous;
        if vt == VT_R8 {
            Some(anon.dblVal)
        } else if vt == VT_R4 {
            Some(anon.fltVal as f64)
        } else if vt == VT_I4 {
            Some(anon.lVal as f64)
        } else if vt == VT_I2 {
            Some(anon.iVal as f64)
        } else {
            None
        }
    }
}

/// Integral VARIANT, for counts and enum values.
pub fn variant_get_i32(v: &VARIANT) -> Option<i32> {
    variant_get_f64(v).map(|n| n as i32)
}

pub fn variant_get_string(v: &VARIANT) -> Option<String> {
    unsafe {
        (v.Anonymous.Anonymous.vt == VT_BSTR)
            .then(|| v.Anonymous.Anonymous.Anonymous.bstrVal.to_string())
    }
}

/// SCODE of a VT_ERROR VARIANT (Excel's `CVErr` values).
pub fn variant_get_error(v: &VARIANT) -> Option<i32> {
    unsafe {
        (v.Anonymous.Anonymous.vt == VT_ERROR).then(|| v.Anonymous.Anonymous.Anonymous.scode)
    }
}

fn variant_get_dispatch(v: &VARIANT) -> Option<IDispatch> {
    unsafe {
        if v.Anonymous.Anonymous.vt == VT_DISPATCH {
            let disp: &Option<IDispatch> = &v.Anonymous.Anonymous.Anonymous.pdispVal;
            disp.clone()
        } else {
            None
        }
    }
}

pub fn variant_is_empty(v: &VARIANT) -> bool {
    unsafe {
        let vt = v.Anonymous.Anonymous.vt;
        vt == VT_EMPTY || vt == VT_NULL
    }
}

/// An IDispatch COM object.
#[derive(Clone)]
pub struct DispatchObject {
    inner: IDispatch,
}

impl DispatchObject {
    /// Instantiate a COM server by ProgID, e.g. `Excel.Application`.
    pub fn create_from_progid(progid: &str) -> Result<Self, String> {
        unsafe {
            let hstr = HSTRING::from(progid);
            let clsid =
                CLSIDFromProgID(&hstr).map_err(|e| format!("CLSIDFromProgID failed: {e}"))?;
            let inner: IDispatch = CoCreateInstance(&clsid, None, CLSCTX_LOCAL_SERVER)
                .map_err(|e| format!("CoCreateInstance failed for '{progid}': {e}"))?;
            Ok(Self { inner })
        }
    }

    fn dispid(&self, name: &str) -> Result<i32, String> {
        unsafe {
            let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
            let names = [PCWSTR(wide.as_ptr())];
            let mut dispid = 0i32;
            self.inner
                .GetIDsOfNames(
                    &GUID::zeroed(),
                    names.as_ptr(),
                    1,
                    GetSystemDefaultLCID(),
                    &mut dispid,
                )
                .map_err(|e| format!("GetIDsOfNames('{name}') failed: {e}"))?;
            Ok(dispid)
        }
    }

    /// Call `name` with arguments in natural order.
    fn invoke(&self, name: &str, flags: DISPATCH_FLAGS, args: &[VARIANT]) -> Result<VARIANT, String> {
        let dispid = self.dispid(name)?;
        // DISPPARAMS wants the last argument first
        let mut reversed: Vec<VARIANT> = args.iter().rev().cloned().collect();
        let mut named = [DISPID_PROPERTYPUT];
        let is_put = flags == DISPATCH_PROPERTYPUT;

        let params = DISPPARAMS {
            rgvarg: if reversed.is_empty() {
                ptr::null_mut()
            } else {
                reversed.as_mut_ptr()
            },
            rgdispidNamedArgs: if is_put {
                named.as_mut_ptr()
            } else {
                ptr::null_mut()
            },
            cArgs: reversed.len() as u32,
            cNamedArgs: u32::from(is_put),
        };

        let mut result = VARIANT::default();
        let mut except = EXCEPINFO::default();
        unsafe {
            self.inner
                .Invoke(
                    dispid,
                    &GUID::zeroed(),
                    GetSystemDefaultLCID(),
                    flags,
                    &params,
                    Some(&mut result),
                    Some(&mut except),
                    None,
                )
                .map_err(|e| format_invoke_error(e, &except, name))?;
        }
        Ok(result)
    }

    /// `obj.Name`
    pub fn get(&self, name: &str) -> Result<VARIANT, String> {
        self.invoke(name, DISPATCH_PROPERTYGET, &[])
    }

    /// `obj.Name(args...)` for parameterized properties like `Cells(r, c)`
    /// or `CodeModule.Lines(start, count)`.
    pub fn get_with(&self, name: &str, args: &[VARIANT]) -> Result<VARIANT, String> {
        self.invoke(name, DISPATCH_PROPERTYGET, args)
    }

    /// `obj.Name = value`
    pub fn set(&self, name: &str, value: VARIANT) -> Result<(), String> {
        self.invoke(name, DISPATCH_PROPERTYPUT, &[value])?;
        Ok(())
    }

    /// `obj.Name args...`
    pub fn call(&self, name: &str, args: &[VARIANT]) -> Result<VARIANT, String> {
        self.invoke(name, DISPATCH_METHOD, args)
    }

    /// A property that returns an object.
    pub fn child(&self, name: &str) -> Result<DispatchObject, String> {
        let variant = self.get(name)?;
        to_object(&variant, name)
    }

    /// A parameterized property that returns an object, e.g. `Worksheets.Item(1)`.
    pub fn child_with(&self, name: &str, args: &[VARIANT]) -> Result<DispatchObject, String> {
        let variant = self.get_with(name, args)?;
        to_object(&variant, name)
    }

    /// A method that returns an object, e.g. `Workbooks.Open(path)`.
    pub fn call_child(&self, name: &str, args: &[VARIANT]) -> Result<DispatchObject, String> {
        let variant = self.call(name, args)?;
        to_object(&variant, name)
    }

    pub fn get_string(&self, name: &str) -> Result<String, String> {
        let variant = self.get(name)?;
        variant_get_string(&variant)
            .ok_or_else(|| format!("'{name}' is not a string (VT={})", variant_vt(&variant)))
    }

    pub fn get_i32(&self, name: &str) -> Result<i32, String> {
        let variant = self.get(name)?;
        variant_get_i32(&variant)
            .ok_or_else(|| format!("'{name}' is not a number (VT={})", variant_vt(&variant)))
    }
}

fn to_object(variant: &VARIANT, context: &str) -> Result<DispatchObject, String> {
    if let Some(inner) = variant_get_dispatch(variant) {
        Ok(DispatchObject { inner })
    } else if variant_is_empty(variant) {
        Err(format!("'{context}' returned empty/null"))
    } else {
        Err(format!(
            "'{context}' returned non-object VARIANT (VT={}), expected VT_DISPATCH",
            variant_vt(variant)
        ))
    }
}

/// Include EXCEPINFO text when the member raised an exception.
fn format_invoke_error(err: windows::core::Error, except: &EXCEPINFO, member: &str) -> String {
    if err.code() != DISP_E_EXCEPTION {
        return format!("Invoke('{member}') failed: {err}");
    }
    let or = |bstr: &BSTR, fallback: &str| {
        if bstr.is_empty() {
            fallback.to_string()
        } else {
            bstr.to_string()
        }
    };
    format!(
        "COM exception in '{member}': {} (source: {})",
        or(&except.bstrDescription, "(no description)"),
        or(&except.bstrSource, "(no source)")
    )
}
