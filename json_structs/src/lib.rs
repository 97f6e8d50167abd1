pub mod remote_data {
    //! Shapes of the air quality feed as they come over the wire.

    use std::collections::HashMap;

    use serde::de::{self, DeserializeOwned};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use tracing::debug;

    use crate::output::{AirQualityReading, Attribution, City, Geo, NO_READING};

    /// Outer `{ "status": ..., "data": ... }` object wrapping every response.
    #[derive(Deserialize, Debug)]
    pub struct Envelope {
        pub status: String,
        pub data: Value,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct RemoteAttribution {
        pub name: String,
        pub url: String,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct RemoteCity {
        pub name: String,
        pub url: String,
        #[serde(default)]
        pub geo: Vec<f64>,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    pub struct IaqiValue {
        pub v: f64,
    }

    /// The `data` member of a successful response.
    #[derive(Deserialize, Debug)]
    pub struct Reading {
        pub idx: i64,
        #[serde(default = "no_reading", deserialize_with = "aqi_or_sentinel")]
        pub aqi: i64,
        #[serde(default, deserialize_with = "objects")]
        pub attributions: Vec<RemoteAttribution>,
        #[serde(default, deserialize_with = "optional_object")]
        pub city: Option<RemoteCity>,
        #[serde(default, deserialize_with = "object_values")]
        pub iaqi: HashMap<String, IaqiValue>,
    }

    /// Deserializes `value` only if it is a JSON object.
    ///
    /// Derived structs would otherwise also accept an array and match its
    /// elements to fields by position.
    pub fn from_object<T>(value: Value) -> serde_json::Result<T>
    where
        T: DeserializeOwned,
    {
        if !value.is_object() {
            return Err(<serde_json::Error as de::Error>::custom(format!(
                "expected a JSON object, found {}",
                kind_of(&value)
            )));
        }
        serde_json::from_value(value)
    }

    fn kind_of(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
        }
    }

    fn objects<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Vec::<Value>::deserialize(deserializer)?
            .into_iter()
            .map(|x| from_object(x).map_err(<D::Error as de::Error>::custom))
            .collect()
    }

    fn optional_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Option::<Value>::deserialize(deserializer)? {
            Some(value) => from_object(value)
                .map(Some)
                .map_err(<D::Error as de::Error>::custom),
            None => Ok(None),
        }
    }

    fn object_values<'de, D, T>(deserializer: D) -> Result<HashMap<String, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        HashMap::<String, Value>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, value)| {
                let value = from_object(value).map_err(|err| {
                    <D::Error as de::Error>::custom(format!("{}: {}", key, err))
                })?;
                Ok((key, value))
            })
            .collect()
    }

    fn no_reading() -> i64 {
        NO_READING
    }

    // Stations without a current measurement report "-" instead of a number.
    fn aqi_or_sentinel<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value.as_i64() {
            Some(aqi) => Ok(aqi),
            None => {
                debug!("aqi is not an integer ({}), using {}", value, NO_READING);
                Ok(NO_READING)
            }
        }
    }

    impl RemoteCity {
        fn into_city(self) -> Option<City> {
            match self.geo.as_slice() {
                [latitude, longitude] => Some(City {
                    name: self.name,
                    url: self.url,
                    geo: Geo {
                        latitude: *latitude,
                        longitude: *longitude,
                    },
                }),
                other => {
                    debug!(
                        "city {:?} has {} geo components, dropping it",
                        self.name,
                        other.len()
                    );
                    None
                }
            }
        }
    }

    impl From<Reading> for AirQualityReading {
        fn from(reading: Reading) -> Self {
            let attributions = reading
                .attributions
                .into_iter()
                .map(|x| Attribution {
                    name: x.name,
                    url: x.url,
                })
                .collect();
            let iaqi = reading
                .iaqi
                .into_iter()
                .map(|(pollutant, value)| (pollutant, value.v))
                .collect();

            AirQualityReading::new(
                reading.idx,
                reading.aqi,
                attributions,
                reading.city.and_then(RemoteCity::into_city),
                iaqi,
            )
        }
    }
}

pub mod output {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    /// Value of `aqi` when the station had nothing to report.
    pub const NO_READING: i64 = -1;

    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
    pub struct Attribution {
        pub name: String,
        pub url: String,
    }

    #[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
    pub struct Geo {
        pub latitude: f64,
        pub longitude: f64,
    }

    /// Monitoring station location.
    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
    pub struct City {
        pub name: String,
        pub url: String,
        pub geo: Geo,
    }

    /// A decoded air quality report for one monitoring station.
    ///
    /// Fields are fixed at construction; use the accessors to read them.
    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
    pub struct AirQualityReading {
        station_id: i64,
        aqi: i64,
        attributions: Vec<Attribution>,
        city: Option<City>,
        iaqi: HashMap<String, f64>,
    }

    impl AirQualityReading {
        pub fn new(
            station_id: i64,
            aqi: i64,
            attributions: Vec<Attribution>,
            city: Option<City>,
            iaqi: HashMap<String, f64>,
        ) -> Self {
            AirQualityReading {
                station_id,
                aqi,
                attributions,
                city,
                iaqi,
            }
        }

        pub fn station_id(&self) -> i64 {
            self.station_id
        }

        /// Headline index, or [`NO_READING`] if the station sent a placeholder.
        pub fn aqi(&self) -> i64 {
            self.aqi
        }

        pub fn has_reading(&self) -> bool {
            self.aqi != NO_READING
        }

        /// Data source credits, in the order the service listed them.
        pub fn attributions(&self) -> &[Attribution] {
            &self.attributions
        }

        pub fn city(&self) -> Option<&City> {
            self.city.as_ref()
        }

        /// Individual sub-index per pollutant code ("pm25", "o3", ...).
        pub fn iaqi(&self) -> &HashMap<String, f64> {
            &self.iaqi
        }

        pub fn pollutant(&self, code: &str) -> Option<f64> {
            self.iaqi.get(code).copied()
        }
    }
}
