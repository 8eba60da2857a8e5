//! Mapping template applied when the index is first created. `timestamp`
//! is the time field; string fields get an unanalyzed `.raw` twin so
//! dashboards can aggregate on them.

pub const MAPPING_TEMPLATE: &str = r#"
{
    "mappings": {
        "log": {
            "properties": {
                "timestamp": {
                    "type": "date"
                }
            },
            "dynamic_templates": [
                {
                    "message_field": {
                        "match_mapping_type": "string",
                        "mapping": {
                            "index": "analyzed",
                            "type": "string",
                            "omit_norms": true
                        },
                        "match": "message"
                    }
                },
                {
                    "string_fields": {
                        "match_mapping_type": "string",
                        "mapping": {
                            "index": "analyzed",
                            "type": "string",
                            "fielddata": {
                                "format": "disabled"
                            },
                            "fields": {
                                "raw": {
                                    "index": "not_analyzed",
                                    "type": "string",
                                    "doc_values": true
                                }
                            },
                            "omit_norms": true
                        },
                        "match": "*"
                    }
                }
            ]
        }
    }
}
"#;
