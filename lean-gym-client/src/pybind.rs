//! Python bindings for lean-gym-client using PyO3.
//!
//! ```python
//! from lean_gym_client import invoke_lean
//!
//! with invoke_lean("~/lean-gym") as conn:
//!     conn.init_search("nat.zero_add")
//!     [init] = conn.collect()
//!     conn.run_tac(init["search_id"], init["tactic_state_id"], "intro n")
//!     print(conn.collect())
//! ```

use std::path::PathBuf;

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::connection::Connection;
use crate::error::Error;
use crate::response::{FieldValue, ResponseRecord};

fn to_py_err(err: Error) -> PyErr {
    match err {
        Error::InvalidState { .. } => {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(err.to_string())
        }
        Error::Config(_) | Error::Io(_) => {
            PyErr::new::<pyo3::exceptions::PyOSError, _>(err.to_string())
        }
        Error::Timeout { .. } => {
            PyErr::new::<pyo3::exceptions::PyTimeoutError, _>(err.to_string())
        }
        _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(err.to_string()),
    }
}

/// Convert a record to a dict of None / int / str / list[str].
fn record_to_py(py: Python<'_>, record: &ResponseRecord) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    for (key, value) in record.iter() {
        match value {
            FieldValue::Null => dict.set_item(key, py.None())?,
            FieldValue::Int(n) => dict.set_item(key, *n)?,
            FieldValue::Text(s) => dict.set_item(key, s)?,
            FieldValue::List(items) => dict.set_item(key, PyList::new(py, items)?)?,
        }
    }
    Ok(dict.into_any().unbind())
}

/// Python wrapper for Connection.
#[pyclass(name = "LeanGymConnection")]
pub struct PyLeanGymConnection {
    inner: Connection,
}

#[pymethods]
impl PyLeanGymConnection {
    #[new]
    fn new(path: PathBuf) -> PyResult<Self> {
        Ok(Self {
            inner: Connection::open(path).map_err(to_py_err)?,
        })
    }

    #[pyo3(signature = (name, namespaces=Vec::new()))]
    fn init_search(&mut self, name: &str, namespaces: Vec<String>) -> PyResult<()> {
        let namespaces: Vec<&str> = namespaces.iter().map(String::as_str).collect();
        self.inner
            .init_search(name, &namespaces)
            .map_err(to_py_err)
    }

    fn run_tac(&mut self, search_id: u64, tactic_state_id: u64, tactic: &str) -> PyResult<()> {
        self.inner
            .run_tac(search_id, tactic_state_id, tactic)
            .map_err(to_py_err)
    }

    fn clear_search(&mut self, search_id: u64) -> PyResult<()> {
        self.inner.clear_search(search_id).map_err(to_py_err)
    }

    /// Wait for all outstanding responses. Releases the GIL while polling.
    fn collect(&mut self, py: Python<'_>) -> PyResult<PyObject> {
        let inner = &mut self.inner;
        let records = py.allow_threads(|| inner.collect()).map_err(to_py_err)?;

        let list = PyList::empty(py);
        for record in &records {
            list.append(record_to_py(py, record)?)?;
        }
        Ok(list.into_any().unbind())
    }

    fn close(&mut self) -> PyResult<()> {
        self.inner.close().map_err(to_py_err)
    }

    #[getter]
    fn outstanding(&self) -> usize {
        self.inner.outstanding()
    }

    #[getter]
    fn closed(&self) -> bool {
        !self.inner.is_open()
    }

    #[getter]
    fn session_name(&self) -> String {
        self.inner.session_name().to_string()
    }

    fn __enter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __exit__(
        &mut self,
        _exc_type: &Bound<'_, PyAny>,
        _exc_value: &Bound<'_, PyAny>,
        _traceback: &Bound<'_, PyAny>,
    ) -> PyResult<bool> {
        if self.inner.is_open() {
            self.inner.close().map_err(to_py_err)?;
        }
        Ok(false)
    }

    fn __repr__(&self) -> String {
        format!(
            "LeanGymConnection(session={:?}, outstanding={}, closed={})",
            self.inner.session_name(),
            self.inner.outstanding(),
            !self.inner.is_open()
        )
    }
}

/// Open a connection for use as a context manager.
#[pyfunction]
fn invoke_lean(path: PathBuf) -> PyResult<PyLeanGymConnection> {
    PyLeanGymConnection::new(path)
}

/// Initialize the lean_gym_client Python module.
#[pymodule]
fn lean_gym_client(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyLeanGymConnection>()?;
    m.add_function(wrap_pyfunction!(invoke_lean, m)?)?;
    Ok(())
}
