mod archive;
mod edge_cases;
mod interop;
