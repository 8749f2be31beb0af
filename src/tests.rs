#[cfg(test)]
mod tests {
    use crate::core::env::{Credentials, KeyKind};
    use crate::core::probe::{
        ColumnInfo, EXEC_SQL, OutputFormat, ProbeOutcome, ProbeRequest, run_probe,
    };
    use crate::core::rpc::{RpcClient, RpcError};
    use serde_json::{Value, json};
    use std::cell::RefCell;
    use std::fs;
    use std::path::PathBuf;
    use std::rc::Rc;
    use tempfile::tempdir;

    type CallLog = Rc<RefCell<Vec<(String, Value)>>>;

    /// Answers `rpc` with a canned result and records every call.
    struct FakeClient {
        response: Result<Value, String>,
        existing_columns: Vec<&'static str>,
        calls: CallLog,
    }

    impl RpcClient for FakeClient {
        fn rpc(&self, function: &str, args: &Value) -> Result<Value, RpcError> {
            self.calls
                .borrow_mut()
                .push((function.to_string(), args.clone()));
            self.response.clone().map_err(RpcError::remote)
        }

        fn select_column(&self, table: &str, column: &str) -> Result<Value, RpcError> {
            self.calls
                .borrow_mut()
                .push((format!("select:{table}"), json!(column)));
            if self.existing_columns.iter().any(|c| *c == column) {
                Ok(json!([]))
            } else {
                Err(RpcError::remote(format!(
                    "column {table}.{column} does not exist"
                )))
            }
        }
    }

    fn request() -> ProbeRequest {
        ProbeRequest {
            table: "disputes".to_string(),
            schema: "public".to_string(),
            format: OutputFormat::Text,
            check_columns: Vec::new(),
        }
    }

    fn write_env(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(".env.local");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_probe_builds_client_from_env_values() {
        let dir = tempdir().unwrap();
        let env_path = write_env(
            &dir,
            "NEXT_PUBLIC_SUPABASE_URL=\"https://proj.supabase.co\"\n\
             NEXT_PUBLIC_SUPABASE_ANON_KEY=anon-key\n\
             NEXT_PUBLIC_SUPABASE_SERVICE_ROLE_KEY='service-key'\n",
        );

        let calls = CallLog::default();
        let seen = RefCell::new(None::<Credentials>);
        let mut out = Vec::new();

        let outcome = run_probe(
            &env_path,
            &request(),
            |creds: &Credentials| -> anyhow::Result<FakeClient> {
                *seen.borrow_mut() = Some(creds.clone());
                Ok(FakeClient {
                    response: Ok(json!([
                        { "column_name": "id", "data_type": "uuid" },
                        { "column_name": "status", "data_type": "text" }
                    ])),
                    existing_columns: Vec::new(),
                    calls: calls.clone(),
                })
            },
            &mut out,
        )
        .unwrap();

        assert_eq!(
            seen.into_inner(),
            Some(Credentials {
                url: "https://proj.supabase.co".to_string(),
                key: "service-key".to_string(),
                key_kind: KeyKind::ServiceRole,
            })
        );

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, EXEC_SQL);
        let sql = calls[0].1["sql"].as_str().unwrap();
        assert!(sql.contains("table_name = 'disputes'"));
        assert!(sql.contains("table_schema = 'public'"));

        match outcome {
            ProbeOutcome::Columns(columns) => assert_eq!(
                columns[0],
                ColumnInfo {
                    column_name: "id".to_string(),
                    data_type: Some("uuid".to_string()),
                }
            ),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Columns in 'disputes':\n - id (uuid)\n - status (text)\n"));
    }

    #[test]
    fn test_probe_missing_key_makes_no_call() {
        let dir = tempdir().unwrap();
        let env_path = write_env(&dir, "NEXT_PUBLIC_SUPABASE_URL=https://proj.supabase.co\n");

        let connected = RefCell::new(false);
        let mut out = Vec::new();
        let outcome = run_probe(
            &env_path,
            &request(),
            |_: &Credentials| -> anyhow::Result<FakeClient> {
                *connected.borrow_mut() = true;
                anyhow::bail!("should not connect")
            },
            &mut out,
        )
        .unwrap();

        assert!(matches!(outcome, ProbeOutcome::MissingConfig));
        assert!(!connected.into_inner());
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("❌ Missing database credentials"));
    }

    #[test]
    fn test_probe_missing_env_file_is_missing_config() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        let outcome = run_probe(
            &dir.path().join("absent.env"),
            &request(),
            |_: &Credentials| -> anyhow::Result<FakeClient> { anyhow::bail!("unreachable") },
            &mut out,
        )
        .unwrap();
        assert!(matches!(outcome, ProbeOutcome::MissingConfig));
    }

    #[test]
    fn test_probe_call_error_is_printed_not_raised() {
        let dir = tempdir().unwrap();
        let env_path = write_env(
            &dir,
            "NEXT_PUBLIC_SUPABASE_URL=https://proj.supabase.co\nNEXT_PUBLIC_SUPABASE_ANON_KEY=anon\n",
        );

        let calls = CallLog::default();
        let mut out = Vec::new();
        let outcome = run_probe(
            &env_path,
            &request(),
            |_: &Credentials| -> anyhow::Result<FakeClient> {
                Ok(FakeClient {
                    response: Err("Could not find the function public.exec_sql".to_string()),
                    existing_columns: Vec::new(),
                    calls: calls.clone(),
                })
            },
            &mut out,
        )
        .unwrap();

        match outcome {
            ProbeOutcome::Failed { error, checks } => {
                assert_eq!(error, "Could not find the function public.exec_sql");
                assert!(checks.is_empty());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(calls.borrow().len(), 1);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("RPC Error: Could not find the function public.exec_sql"));
    }

    #[test]
    fn test_probe_client_construction_error_is_printed() {
        let dir = tempdir().unwrap();
        let env_path = write_env(
            &dir,
            "NEXT_PUBLIC_SUPABASE_URL=https://proj.supabase.co\nNEXT_PUBLIC_SUPABASE_ANON_KEY=anon\n",
        );

        let mut out = Vec::new();
        let outcome = run_probe(
            &env_path,
            &request(),
            |_: &Credentials| -> anyhow::Result<FakeClient> { anyhow::bail!("tls backend unavailable") },
            &mut out,
        )
        .unwrap();

        assert!(matches!(outcome, ProbeOutcome::Failed { .. }));
        assert!(String::from_utf8(out).unwrap().contains("RPC Error: tls backend unavailable"));
    }

    #[test]
    fn test_probe_falls_back_to_column_checks() {
        let dir = tempdir().unwrap();
        let env_path = write_env(
            &dir,
            "NEXT_PUBLIC_SUPABASE_URL=https://proj.supabase.co\nNEXT_PUBLIC_SUPABASE_ANON_KEY=anon\n",
        );

        let mut probe = request();
        probe.check_columns = vec!["status".to_string(), "dispute_status".to_string()];

        let calls = CallLog::default();
        let mut out = Vec::new();
        let outcome = run_probe(
            &env_path,
            &probe,
            |_: &Credentials| -> anyhow::Result<FakeClient> {
                Ok(FakeClient {
                    response: Err("permission denied for function exec_sql".to_string()),
                    existing_columns: vec!["status"],
                    calls: calls.clone(),
                })
            },
            &mut out,
        )
        .unwrap();

        let ProbeOutcome::Failed { checks, .. } = outcome else {
            panic!("expected a failed probe");
        };
        assert_eq!(checks.len(), 2);
        assert!(checks[0].exists);
        assert!(!checks[1].exists);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("status exists: true\n"));
        assert!(printed.contains("dispute_status exists: false\n"));
        assert!(printed.contains("dispute_status Error: column disputes.dispute_status does not exist"));
        assert_eq!(calls.borrow().len(), 3);
    }

    #[test]
    fn test_probe_skips_column_checks_on_success() {
        let dir = tempdir().unwrap();
        let env_path = write_env(
            &dir,
            "NEXT_PUBLIC_SUPABASE_URL=https://proj.supabase.co\nNEXT_PUBLIC_SUPABASE_ANON_KEY=anon\n",
        );

        let mut probe = request();
        probe.check_columns = vec!["status".to_string()];

        let calls = CallLog::default();
        let mut out = Vec::new();
        run_probe(
            &env_path,
            &probe,
            |_: &Credentials| -> anyhow::Result<FakeClient> {
                Ok(FakeClient {
                    response: Ok(json!([])),
                    existing_columns: vec!["status"],
                    calls: calls.clone(),
                })
            },
            &mut out,
        )
        .unwrap();

        assert_eq!(calls.borrow().len(), 1);
    }
}
