// src/core/catalog.rs

//! The static catalog of external tools this pipeline drives. Making the
//! battery data-driven keeps tool availability a configuration concern:
//! a disabled entry is simply absent from the active list, never a
//! special runtime state. Argument vectors carry `{domain}`, `{host}` and
//! `{artifact}` placeholders that are filled at instantiation time.

use crate::core::models::{CommandSpec, PipelineConfig};

/// One entry of the primary, domain-level battery.
pub struct CommandTemplate {
    /// Stable identifier; also names the default artifact file.
    pub name: &'static str,
    pub program: &'static str,
    pub args: &'static [&'static str],
    /// Policy switch. Disabled templates are excluded from the active
    /// list entirely.
    pub enabled: bool,
}

/// One per-subdomain probe. Aggregated probes funnel every host's output
/// into a single shared append-mode artifact; the others get one artifact
/// per host.
pub struct ProbeTemplate {
    pub name: &'static str,
    pub program: &'static str,
    pub args: &'static [&'static str],
    pub aggregate: bool,
}

/// The primary battery, run once against the root domain.
pub static PRIMARY_COMMANDS: &[CommandTemplate] = &[
    CommandTemplate {
        name: "dmitry",
        program: "dmitry",
        args: &["-wines", "{domain}"],
        enabled: true,
    },
    CommandTemplate {
        name: "theharvester",
        program: "theHarvester",
        args: &[
            "-b",
            "baidu,bevigil,bing,bingapi,certspotter,crtsh,dnsdumpster,duckduckgo,hackertarget,otx,threatminer,urlscan,yahoo",
            "-l",
            "1000",
            "-d",
            "{domain}",
        ],
        enabled: true,
    },
    CommandTemplate {
        name: "assetfinder",
        program: "assetfinder",
        args: &["--subs-only", "{domain}"],
        enabled: true,
    },
    CommandTemplate {
        name: "subfinder",
        program: "subfinder",
        args: &["-silent", "-t", "10", "-timeout", "3", "-nW", "-d", "{domain}"],
        enabled: true,
    },
    CommandTemplate {
        name: "dig_ns",
        program: "dig",
        args: &["+noall", "+answer", "-t", "NS", "{domain}"],
        enabled: true,
    },
    CommandTemplate {
        name: "dig_mx",
        program: "dig",
        args: &["+noall", "+answer", "-t", "MX", "{domain}"],
        enabled: true,
    },
    CommandTemplate {
        name: "fierce",
        program: "fierce",
        args: &["--domain", "{domain}"],
        enabled: true,
    },
    CommandTemplate {
        name: "dnsrecon",
        program: "dnsrecon",
        args: &["-t", "std", "-d", "{domain}"],
        enabled: true,
    },
    // Noisy against targets fronted by a WAF; off by default.
    CommandTemplate {
        name: "snallygaster",
        program: "snallygaster",
        args: &["--nowww", "{domain}"],
        enabled: false,
    },
    CommandTemplate {
        name: "whatweb",
        program: "whatweb",
        args: &["-v", "{domain}"],
        enabled: true,
    },
    CommandTemplate {
        name: "parsero",
        program: "parsero",
        args: &["-sb", "-u", "{domain}"],
        enabled: true,
    },
    CommandTemplate {
        name: "wpscan",
        program: "wpscan",
        args: &["--url", "{domain}", "--random-user-agent", "--no-update"],
        enabled: true,
    },
    CommandTemplate {
        name: "testssl",
        program: "testssl",
        args: &["--openssl", "/usr/bin/openssl", "{domain}"],
        enabled: true,
    },
    // chad needs a pre-created results directory (a compound shell line in
    // the reference); a structured argv cannot express it.
    CommandTemplate {
        name: "chad",
        program: "chad",
        args: &[
            "-sos", "no", "-d", "chad_results", "-tr", "100", "-q",
            "ext:txt OR ext:pdf OR ext:doc OR ext:docx OR ext:xls OR ext:xlsx",
            "-s", "*.{domain}",
        ],
        enabled: false,
    },
    // git-dumper writes a results directory instead of stdout.
    CommandTemplate {
        name: "git_dumper",
        program: "git-dumper",
        args: &["https://{domain}/.git", "git_dumper_results"],
        enabled: false,
    },
    CommandTemplate {
        name: "getallurls",
        program: "getallurls",
        args: &["-subs", "{domain}"],
        enabled: true,
    },
    CommandTemplate {
        name: "dirsearch",
        program: "dirsearch",
        args: &[
            "-e",
            "php,js,conf,config,txt,py,sh,zip,rar",
            "-f",
            "--exclude-texts=Not found, 404, cloudflare, cloudfront, blocked",
            "-u",
            "{domain}",
        ],
        enabled: true,
    },
];

/// The secondary wave: one directory brute-force per discovered subdomain.
pub static SECONDARY_PROBES: &[ProbeTemplate] = &[ProbeTemplate {
    name: "dirsearch",
    program: "dirsearch",
    args: &[
        "--no-color",
        "-q",
        "-e",
        "php,js,conf,config,txt,py,sh,zip,rar",
        "-f",
        "--exclude-texts=Not found, 404, cloudflare, cloudfront, blocked",
        "-u",
        "{host}",
        "-o",
        "{artifact}",
    ],
    aggregate: false,
}];

/// The fingerprint wave: whatweb on every subdomain, pooled into one
/// shared artifact that also feeds the CDN statistic.
pub static FINGERPRINT_PROBES: &[ProbeTemplate] = &[ProbeTemplate {
    name: "whatweb",
    program: "whatweb",
    args: &["--color=never", "{host}"],
    aggregate: true,
}];

/// Instantiates the active primary battery against the root domain.
pub fn active_primary(config: &PipelineConfig) -> Vec<CommandSpec> {
    PRIMARY_COMMANDS
        .iter()
        .filter(|tpl| tpl.enabled)
        .map(|tpl| {
            let args = tpl
                .args
                .iter()
                .map(|a| a.replace("{domain}", &config.domain))
                .collect();
            CommandSpec::new(tpl.name, tpl.program, args, config.artifact_for(tpl.name))
        })
        .collect()
}

/// The artifact a probe template writes for a given host. Aggregated
/// probes share one file across all hosts.
pub fn probe_artifact(
    tpl: &ProbeTemplate,
    host: &str,
    config: &PipelineConfig,
) -> std::path::PathBuf {
    if tpl.aggregate {
        config.artifact_for(&format!("{}_subdomains", tpl.name))
    } else {
        config.artifact_for(&format!("{}_{}", tpl.name, host))
    }
}

/// Instantiates one probe template against a single subdomain.
pub fn instantiate_probe(tpl: &ProbeTemplate, host: &str, config: &PipelineConfig) -> CommandSpec {
    let artifact = probe_artifact(tpl, host, config);
    let artifact_str = artifact.to_string_lossy().to_string();
    let args = tpl
        .args
        .iter()
        .map(|a| a.replace("{host}", host).replace("{artifact}", &artifact_str))
        .collect();
    let name = format!("{}_{}", tpl.name, host);
    let spec = CommandSpec::new(name, tpl.program, args, artifact);
    if tpl.aggregate { spec.append_mode() } else { spec }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> PipelineConfig {
        PipelineConfig {
            domain: "example.com".to_string(),
            output_dir: std::path::PathBuf::from("/tmp/recon"),
            jobs: 4,
            timeout: Duration::from_secs(600),
            report_path: std::path::PathBuf::from("recon_report.txt"),
        }
    }

    #[test]
    fn disabled_templates_are_excluded_from_the_active_list() {
        let specs = active_primary(&config());
        assert!(specs.iter().all(|s| s.name != "chad" && s.name != "git_dumper"));
        assert!(specs.iter().any(|s| s.name == "subfinder"));
    }

    #[test]
    fn domain_placeholder_is_interpolated() {
        let specs = active_primary(&config());
        let subfinder = specs.iter().find(|s| s.name == "subfinder").unwrap();
        assert!(subfinder.args.contains(&"example.com".to_string()));
        assert!(!subfinder.args.iter().any(|a| a.contains("{domain}")));
    }

    #[test]
    fn dig_variants_get_distinct_artifacts() {
        let specs = active_primary(&config());
        let ns = specs.iter().find(|s| s.name == "dig_ns").unwrap();
        let mx = specs.iter().find(|s| s.name == "dig_mx").unwrap();
        assert_ne!(ns.artifact, mx.artifact);
    }

    #[test]
    fn per_host_probe_gets_its_own_artifact_and_args() {
        let cfg = config();
        let spec = instantiate_probe(&SECONDARY_PROBES[0], "api.example.com", &cfg);
        assert!(!spec.append);
        assert!(spec
            .artifact
            .to_string_lossy()
            .contains("dirsearch_api.example.com"));
        assert!(spec.args.contains(&"api.example.com".to_string()));
        assert!(spec.args.iter().any(|a| a == &spec.artifact.to_string_lossy()));
    }

    #[test]
    fn aggregate_probe_shares_one_append_artifact() {
        let cfg = config();
        let a = instantiate_probe(&FINGERPRINT_PROBES[0], "a.example.com", &cfg);
        let b = instantiate_probe(&FINGERPRINT_PROBES[0], "b.example.com", &cfg);
        assert!(a.append && b.append);
        assert_eq!(a.artifact, b.artifact);
    }
}
